//! Domain newtypes with validation
//!
//! This module provides strongly-typed wrappers for domain values.
//! Each newtype ensures data validity at construction time.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::errors::DomainError;

/// Character used to flatten hierarchical paths into a single flat-namespace
/// object key. Object stores have no native directory concept, so `a/b/c`
/// is stored under the key `a~b~c`.
pub const FLATTEN_SEPARATOR: char = '~';

// ============================================================================
// RelPath
// ============================================================================

/// A path relative to a container root.
///
/// Always `/`-separated, never absolute, never containing `.` or `..`
/// components. The empty path denotes the container root itself.
///
/// `RelPath` is the only path currency between the sync engine and the
/// storage backends; conversion to filesystem paths or flat object keys
/// happens at the adapter boundary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RelPath(String);

impl RelPath {
    /// The container root (empty path).
    pub fn root() -> Self {
        Self(String::new())
    }

    /// Validates and wraps a relative path string.
    ///
    /// Rejects absolute paths, backslashes, empty components, and dot
    /// components. The empty string is accepted and denotes the root.
    pub fn new(path: impl Into<String>) -> Result<Self, DomainError> {
        let path = path.into();
        if path.is_empty() {
            return Ok(Self(path));
        }
        if path.starts_with('/') || path.ends_with('/') {
            return Err(DomainError::InvalidPath(path));
        }
        if path.contains('\\') {
            return Err(DomainError::InvalidPath(path));
        }
        for component in path.split('/') {
            if component.is_empty() || component == "." || component == ".." {
                return Err(DomainError::InvalidPath(path));
            }
        }
        Ok(Self(path))
    }

    /// Returns true if this is the container root.
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// The underlying `/`-separated string (empty for the root).
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Appends a single entry name, validating it as one path component.
    pub fn join(&self, name: &str) -> Result<Self, DomainError> {
        if name.is_empty() || name.contains('/') || name.contains('\\') {
            return Err(DomainError::InvalidName(name.to_string()));
        }
        if name == "." || name == ".." {
            return Err(DomainError::InvalidName(name.to_string()));
        }
        if self.is_root() {
            Ok(Self(name.to_string()))
        } else {
            Ok(Self(format!("{}/{}", self.0, name)))
        }
    }

    /// The final path component, if any.
    pub fn file_name(&self) -> Option<&str> {
        if self.is_root() {
            None
        } else {
            self.0.rsplit('/').next()
        }
    }

    /// Iterates over the path components (empty for the root).
    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|c| !c.is_empty())
    }

    /// Returns the remainder of `self` below `prefix`, if `self` is
    /// strictly inside `prefix`.
    pub fn strip_prefix(&self, prefix: &RelPath) -> Option<&str> {
        if prefix.is_root() {
            if self.is_root() {
                None
            } else {
                Some(&self.0)
            }
        } else {
            self.0
                .strip_prefix(prefix.as_str())
                .and_then(|rest| rest.strip_prefix('/'))
        }
    }

    /// The flat-namespace object key for this path (`/` replaced with `~`).
    pub fn flatten(&self) -> String {
        self.0.replace('/', &FLATTEN_SEPARATOR.to_string())
    }

    /// Inverts [`RelPath::flatten`], validating the result.
    pub fn unflatten(key: &str) -> Result<Self, DomainError> {
        Self::new(key.replace(FLATTEN_SEPARATOR, "/"))
    }
}

impl Display for RelPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            write!(f, "<root>")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl FromStr for RelPath {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for RelPath {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RelPath> for String {
    fn from(path: RelPath) -> Self {
        path.0
    }
}

// ============================================================================
// Checksum
// ============================================================================

/// Number of hex characters in a SHA-512 digest.
const CHECKSUM_HEX_LEN: usize = 128;

/// A lowercase-hex SHA-512 content digest.
///
/// Computed once per file handle and cached for the lifetime of that
/// handle. Equality of two checksums is treated as content equality; this
/// is a probabilistic but practically certain guarantee and is not meant
/// to resist an adversary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Checksum(String);

impl Checksum {
    /// Validates and wraps a hex digest string.
    pub fn new(hex_digest: impl Into<String>) -> Result<Self, DomainError> {
        let hex_digest = hex_digest.into();
        if hex_digest.len() != CHECKSUM_HEX_LEN {
            return Err(DomainError::InvalidChecksum(hex_digest));
        }
        if !hex_digest
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
        {
            return Err(DomainError::InvalidChecksum(hex_digest));
        }
        Ok(Self(hex_digest))
    }

    /// Wraps a digest already known to be valid lowercase hex of the right
    /// length (produced by the checksum engine).
    pub(crate) fn from_valid_hex(hex_digest: String) -> Self {
        debug_assert_eq!(hex_digest.len(), CHECKSUM_HEX_LEN);
        Self(hex_digest)
    }

    /// The hex digest string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// An abbreviated form for log lines.
    pub fn short(&self) -> &str {
        &self.0[..12]
    }
}

impl Display for Checksum {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Checksum {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Checksum {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Checksum> for String {
    fn from(checksum: Checksum) -> Self {
        checksum.0
    }
}
