//! Object store port (driven/secondary port)
//!
//! Low-level interface to a flat-namespace object store. Keys are opaque
//! strings; the remote storage backend produces them by flattening
//! [`RelPath`](crate::domain::newtypes::RelPath) values (`/` replaced with
//! `~`). The concrete wire protocol (HTTP verbs, pagination format,
//! authentication) belongs to the adapter implementing this trait.
//!
//! ## Design Notes
//!
//! - All methods return typed [`StoreError`]s so the retry policy can
//!   branch on failure class without inspecting messages.
//! - `list_page` returns one page per call; callers paginate with a
//!   continuation marker until an empty page is returned. Remote listings
//!   are only eventually consistent, which is why existence is resolved
//!   through an index built from these pages rather than per-key probes.
//! - `upload` must be idempotent: storing the same key twice is a
//!   full overwrite, safe to retry.

use std::path::Path;

use crate::error::StoreResult;

/// Metadata for a stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectMeta {
    /// Object size in bytes
    pub size: u64,
}

/// Port trait for flat-namespace object storage.
#[async_trait::async_trait]
pub trait IObjectStore: Send + Sync {
    /// Reads an entire object into memory.
    ///
    /// Only for objects known to be small (manifests, checksum side-cars);
    /// file payloads go through [`IObjectStore::download`].
    async fn get(&self, key: &str) -> StoreResult<Vec<u8>>;

    /// Streams an object's bytes into the local file at `dest`.
    async fn download(&self, key: &str, dest: &Path) -> StoreResult<()>;

    /// Uploads the local file at `src` under `key`, replacing any existing
    /// object. Idempotent.
    async fn upload(&self, key: &str, src: &Path) -> StoreResult<()>;

    /// Uploads an in-memory payload under `key`, replacing any existing
    /// object. Idempotent.
    async fn upload_bytes(&self, key: &str, data: &[u8]) -> StoreResult<()>;

    /// Deletes the object under `key`.
    async fn delete(&self, key: &str) -> StoreResult<()>;

    /// Returns one page of keys, optionally restricted to `prefix`,
    /// starting after `marker`. An empty page terminates pagination.
    async fn list_page(
        &self,
        prefix: Option<&str>,
        marker: Option<&str>,
    ) -> StoreResult<Vec<String>>;

    /// Returns metadata for the object under `key`.
    async fn head(&self, key: &str) -> StoreResult<ObjectMeta>;
}
