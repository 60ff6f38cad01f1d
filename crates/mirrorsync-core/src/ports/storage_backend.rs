//! Storage backend port (the capability contract)
//!
//! The sync engine drives both sides of a run through these traits and
//! never branches on backend identity. Two implementations exist: a local
//! filesystem backend and a remote object-store backend layered on
//! [`IObjectStore`](super::object_store::IObjectStore).
//!
//! ## Ownership
//!
//! - A backend owns nothing beyond its configuration; directories are
//!   opened lazily, one scope at a time, as the walk descends.
//! - A directory owns its manifest and existence index for as long as the
//!   walk is inside it; buffered manifest updates must be flushed before
//!   the scope is abandoned.
//! - An entry owns its own checksum cache and holds a non-owning handle to
//!   its parent directory's shared state for manifest write-back during
//!   checksum migration.
//!
//! ## Concurrency
//!
//! All methods take `&self`; implementations use interior mutability. The
//! contract assumes a single writer per destination directory per run.

use std::path::{Path, PathBuf};

use crate::domain::newtypes::{Checksum, RelPath};
use crate::error::StoreResult;
use crate::staging::StagingFile;

/// What kind of node an entry is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// A regular file
    File,
    /// A directory (the walk recurses into it)
    Directory,
    /// A symbolic link (never synchronized)
    Symlink,
}

/// Port trait for a storage location (local root or remote container).
#[async_trait::async_trait]
pub trait IStorageBackend: Send + Sync {
    /// Opens a directory scope.
    ///
    /// Lazy: for remote backends this is where the manifest is loaded and
    /// the existence index is built (paginated enumeration with a
    /// continuation marker until an empty page is returned).
    async fn open_directory(&self, path: &RelPath) -> StoreResult<Box<dyn IStorageDirectory>>;
}

/// Port trait for one open directory scope.
#[async_trait::async_trait]
pub trait IStorageDirectory: Send + Sync {
    /// Path of this directory relative to the container root.
    fn path(&self) -> &RelPath;

    /// Entry names in this directory. Finite, one pass per call; order is
    /// implementation-defined and not contractual.
    async fn list_entries(&self) -> StoreResult<Vec<String>>;

    /// Resolves the entry with the given name (which may not exist yet at
    /// a destination).
    async fn entry(&self, name: &str) -> StoreResult<Box<dyn IStorageEntry>>;

    /// Buffers a manifest update for `path`. Cheap; nothing is written
    /// until [`IStorageDirectory::flush_manifest`].
    async fn record_checksum(&self, path: &RelPath, checksum: Checksum) -> StoreResult<()>;

    /// Writes the full manifest (delete-then-recreate semantics, not a
    /// patch), clearing the pending-update counter.
    async fn flush_manifest(&self) -> StoreResult<()>;

    /// Number of buffered updates since the last flush; drives the
    /// engine's batching policy.
    async fn pending_updates(&self) -> usize;
}

/// Port trait for one entry (file, directory, or symlink) in a directory.
#[async_trait::async_trait]
pub trait IStorageEntry: Send + Sync {
    /// Full path of this entry relative to the container root.
    fn rel_path(&self) -> &RelPath;

    /// Whether the entry currently exists. Local backends stat the
    /// filesystem; remote backends answer from the existence index built
    /// at directory-open time, O(1), no network call.
    async fn exists(&self) -> StoreResult<bool>;

    /// The entry's node kind.
    async fn kind(&self) -> StoreResult<EntryKind>;

    /// Size in bytes. Cached per handle.
    async fn size(&self) -> StoreResult<u64>;

    /// Content checksum. Cached for the lifetime of the handle; never
    /// recomputed unless the handle is discarded. Remote destinations
    /// resolve this through checksum migration (manifest entry, then
    /// legacy side-car, then fetch-and-hash; the latter two write the
    /// discovered checksum back to the manifest).
    async fn checksum(&self) -> StoreResult<Checksum>;

    /// Materializes the entry's bytes into a local staging file. The
    /// caller owns the staging file; it is deleted when dropped.
    async fn fetch(&self) -> StoreResult<StagingFile>;

    /// Uploads/copies the local file at `local` to this entry's location.
    /// Full overwrite, idempotent, safe to retry.
    async fn store(&self, local: &Path) -> StoreResult<()>;

    /// For local backends, the real filesystem path of this entry, letting
    /// the engine skip staging. Remote backends return `None`.
    fn local_source_path(&self) -> Option<PathBuf>;
}
