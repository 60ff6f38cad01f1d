//! Per-directory checksum manifest
//!
//! A [`Manifest`] maps full relative file paths to their last-known content
//! checksum. One manifest describes exactly one directory (non-recursive)
//! and lives physically inside that directory under [`MANIFEST_NAME`].
//!
//! ## Serialization
//!
//! The wire form is a JSON object with sorted keys and 4-space indentation,
//! so serializing the same mapping twice produces byte-identical output
//! regardless of insertion order. Repeated writes of an unchanged manifest
//! therefore cause no spurious diffs.
//!
//! ## Corruption policy
//!
//! Content that fails to parse degrades to an empty manifest ("nothing
//! known"), forcing destination files through full checksum recomputation
//! instead of aborting the run.

use std::collections::BTreeMap;

use serde::Serialize;

use super::newtypes::{Checksum, RelPath};

/// Fixed name of the manifest file within the directory it describes.
pub const MANIFEST_NAME: &str = ".shalist";

/// Suffix of the legacy per-file checksum side-car objects.
pub const SIDECAR_SUFFIX: &str = ".sha512";

/// Suffix of editor backup files, never synchronized.
pub const BACKUP_SUFFIX: &str = "~";

/// Returns true for entry names that denote internal bookkeeping artifacts
/// (the manifest itself, legacy side-cars, editor backups). Such entries
/// are never sync candidates on either backend.
pub fn is_internal_name(name: &str) -> bool {
    name.ends_with(MANIFEST_NAME) || name.ends_with(SIDECAR_SUFFIX) || name.ends_with(BACKUP_SUFFIX)
}

/// Mapping from full relative file path to content checksum for one
/// directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    entries: BTreeMap<String, Checksum>,
}

impl Manifest {
    /// An empty manifest.
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up the stored checksum for a path.
    pub fn get(&self, path: &RelPath) -> Option<&Checksum> {
        self.entries.get(path.as_str())
    }

    /// Returns true if the path has a stored checksum.
    pub fn contains(&self, path: &RelPath) -> bool {
        self.entries.contains_key(path.as_str())
    }

    /// Records or replaces the checksum for a path.
    pub fn insert(&mut self, path: &RelPath, checksum: Checksum) {
        self.entries.insert(path.as_str().to_string(), checksum);
    }

    /// Number of recorded paths.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no paths are recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(path, checksum)` pairs in sorted path order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Checksum)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Merges all entries of `other` into `self`, `other` winning on
    /// conflicting paths. Used for snapshot-then-merge updates: callers
    /// accumulate pending entries in a separate manifest and merge them in
    /// one step rather than mutating a map they are iterating.
    pub fn merge(&mut self, other: &Manifest) {
        for (path, checksum) in &other.entries {
            self.entries.insert(path.clone(), checksum.clone());
        }
    }

    /// Removes all entries, keeping the allocation.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Serializes to the canonical wire form: JSON object, sorted keys,
    /// 4-space indentation, trailing newline.
    pub fn to_json(&self) -> String {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        // Serializing a BTreeMap<String, Checksum> cannot fail.
        self.entries
            .serialize(&mut serializer)
            .expect("manifest serialization is infallible");
        buf.push(b'\n');
        String::from_utf8(buf).expect("serde_json produces UTF-8")
    }

    /// Parses the wire form. Invalid JSON, non-object content, or malformed
    /// checksum values all fail the parse.
    pub fn parse(content: &str) -> Result<Self, serde_json::Error> {
        let entries: BTreeMap<String, Checksum> = serde_json::from_str(content)?;
        Ok(Self { entries })
    }
}
