//! Remote object-store backend
//!
//! Presents a flat-namespace object store as a directory tree. Paths are
//! flattened into object keys (`/` becomes `~`), each directory's manifest
//! lives under `<dir>~.shalist` (bare `.shalist` at the root), and
//! existence is answered from an index enumerated once per directory open
//! rather than per-key probes, because remote listings are only eventually
//! consistent and per-key round-trips would dominate the run.
//!
//! ## Checksum migration
//!
//! `checksum()` resolves a destination file's digest through three sources
//! in order: the manifest, a legacy `<key>.sha512` side-car object (read,
//! then deleted), and finally fetch-and-hash of the object itself. The
//! latter two write the discovered checksum back to the manifest
//! immediately, so a run that paid the expensive path converges the state
//! and the next run takes the cheap path.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, warn};

use mirrorsync_core::checksum::checksum_file;
use mirrorsync_core::domain::manifest::{is_internal_name, Manifest, MANIFEST_NAME, SIDECAR_SUFFIX};
use mirrorsync_core::domain::newtypes::{Checksum, RelPath, FLATTEN_SEPARATOR};
use mirrorsync_core::error::{StoreError, StoreResult};
use mirrorsync_core::ports::object_store::IObjectStore;
use mirrorsync_core::ports::storage_backend::{
    EntryKind, IStorageBackend, IStorageDirectory, IStorageEntry,
};
use mirrorsync_core::staging::StagingFile;

use crate::pending::PendingManifest;

/// Attempts for the network calls made while opening a directory.
const OPEN_ATTEMPTS: u32 = 3;

/// A container in a flat-namespace object store, viewed as a directory
/// tree.
pub struct RemoteBackend {
    store: Arc<dyn IObjectStore>,
}

impl RemoteBackend {
    pub fn new(store: Arc<dyn IObjectStore>) -> Self {
        Self { store }
    }
}

/// Object key of a directory's manifest.
fn manifest_key(dir: &RelPath) -> String {
    if dir.is_root() {
        MANIFEST_NAME.to_string()
    } else {
        format!("{}{}{}", dir.flatten(), FLATTEN_SEPARATOR, MANIFEST_NAME)
    }
}

/// Listing prefix covering everything under a directory.
fn listing_prefix(dir: &RelPath) -> Option<String> {
    if dir.is_root() {
        None
    } else {
        Some(format!("{}{}", dir.flatten(), FLATTEN_SEPARATOR))
    }
}

#[async_trait]
impl IStorageBackend for RemoteBackend {
    async fn open_directory(&self, path: &RelPath) -> StoreResult<Box<dyn IStorageDirectory>> {
        let manifest_key = manifest_key(path);
        let manifest = load_manifest(self.store.as_ref(), path, &manifest_key).await?;
        let index = build_index(self.store.as_ref(), path).await?;

        // Immediate subdirectory names fall out of the index: any indexed
        // path strictly deeper than one level implies its first component.
        let mut subdirs = BTreeSet::new();
        for indexed in &index {
            if let Some(rest) = indexed.strip_prefix(path) {
                if let Some((first, _)) = rest.split_once('/') {
                    subdirs.insert(first.to_string());
                }
            }
        }

        debug!(
            path = %path,
            manifest_entries = manifest.len(),
            indexed = index.len(),
            subdirs = subdirs.len(),
            "Opened remote directory"
        );

        Ok(Box::new(RemoteDirectory {
            state: Arc::new(RemoteDirState {
                path: path.clone(),
                store: Arc::clone(&self.store),
                manifest_key,
                manifest: Mutex::new(PendingManifest::new(manifest)),
                index,
                subdirs,
            }),
        }))
    }
}

/// Loads a directory manifest with bounded retries.
///
/// Absence and corruption both degrade to an empty manifest; so does
/// transient-failure exhaustion, trading redundant re-hashing for forward
/// progress. Only a permanent failure propagates.
async fn load_manifest(
    store: &dyn IObjectStore,
    dir: &RelPath,
    key: &str,
) -> StoreResult<Manifest> {
    let mut attempt = 1;
    let bytes = loop {
        match store.get(key).await {
            Ok(bytes) => break bytes,
            Err(StoreError::NotFound { .. }) => return Ok(Manifest::new()),
            Err(err) if err.is_retryable() && attempt < OPEN_ATTEMPTS => {
                warn!(dir = %dir, attempt, %err, "Manifest fetch failed, retrying");
                attempt += 1;
            }
            Err(err) if err.is_retryable() => {
                warn!(dir = %dir, %err, "Manifest fetch exhausted retries, treating as empty");
                return Ok(Manifest::new());
            }
            Err(err) => return Err(err),
        }
    };

    let content = String::from_utf8_lossy(&bytes);
    match Manifest::parse(&content) {
        Ok(manifest) => Ok(manifest),
        Err(err) => {
            warn!(dir = %dir, %err, "Manifest failed to parse, treating as empty");
            Ok(Manifest::new())
        }
    }
}

/// Enumerates every object under `dir` into an existence index, paginating
/// with a continuation marker until an empty page comes back. Bookkeeping
/// keys and keys that do not unflatten to a valid path are skipped.
async fn build_index(store: &dyn IObjectStore, dir: &RelPath) -> StoreResult<BTreeSet<RelPath>> {
    let prefix = listing_prefix(dir);
    let mut index = BTreeSet::new();
    let mut marker: Option<String> = None;

    loop {
        let page = list_page_with_retry(store, dir, prefix.as_deref(), marker.as_deref()).await?;
        if page.is_empty() {
            break;
        }
        marker = page.last().cloned();

        for key in page {
            if is_internal_name(&key) {
                continue;
            }
            match RelPath::unflatten(&key) {
                Ok(path) => {
                    index.insert(path);
                }
                Err(err) => {
                    warn!(dir = %dir, %key, %err, "Skipping unparseable object key");
                }
            }
        }
    }
    Ok(index)
}

async fn list_page_with_retry(
    store: &dyn IObjectStore,
    dir: &RelPath,
    prefix: Option<&str>,
    marker: Option<&str>,
) -> StoreResult<Vec<String>> {
    let mut attempt = 1;
    loop {
        match store.list_page(prefix, marker).await {
            Ok(page) => return Ok(page),
            Err(err) if err.is_retryable() && attempt < OPEN_ATTEMPTS => {
                warn!(dir = %dir, attempt, %err, "Listing page failed, retrying");
                attempt += 1;
            }
            // An incomplete index would misreport existence for the whole
            // directory, so exhaustion fails the open.
            Err(err) => return Err(err),
        }
    }
}

struct RemoteDirState {
    path: RelPath,
    store: Arc<dyn IObjectStore>,
    manifest_key: String,
    manifest: Mutex<PendingManifest>,
    index: BTreeSet<RelPath>,
    subdirs: BTreeSet<String>,
}

impl RemoteDirState {
    /// Writes the merged manifest as a full overwrite of the manifest
    /// object, then commits the pending set. No-op when nothing is
    /// buffered, so re-flushing an unchanged directory costs no request.
    async fn flush(&self) -> StoreResult<()> {
        let mut state = self.manifest.lock().await;
        if !state.has_pending() {
            return Ok(());
        }
        let merged = state.merged();
        self.store
            .upload_bytes(&self.manifest_key, merged.to_json().as_bytes())
            .await?;
        debug!(dir = %self.path, entries = merged.len(), "Flushed remote manifest");
        state.commit();
        Ok(())
    }

    /// Records a migrated checksum and flushes immediately, so a checksum
    /// discovered the expensive way is durable even if the run stops here.
    async fn record_and_flush(&self, path: &RelPath, checksum: Checksum) -> StoreResult<()> {
        self.manifest.lock().await.record(path, checksum);
        self.flush().await
    }
}

struct RemoteDirectory {
    state: Arc<RemoteDirState>,
}

#[async_trait]
impl IStorageDirectory for RemoteDirectory {
    fn path(&self) -> &RelPath {
        &self.state.path
    }

    async fn list_entries(&self) -> StoreResult<Vec<String>> {
        // Direct children of this directory, from the index; deeper paths
        // are represented by their first component via `subdirs`.
        let mut names: Vec<String> = self
            .state
            .index
            .iter()
            .filter_map(|indexed| indexed.strip_prefix(&self.state.path))
            .filter(|rest| !rest.contains('/'))
            .map(str::to_string)
            .collect();
        names.extend(self.state.subdirs.iter().cloned());
        Ok(names)
    }

    async fn entry(&self, name: &str) -> StoreResult<Box<dyn IStorageEntry>> {
        let rel_path = self
            .state
            .path
            .join(name)
            .map_err(|err| StoreError::permanent(err.to_string()))?;
        let key = rel_path.flatten();
        Ok(Box::new(RemoteEntry {
            dir: Arc::clone(&self.state),
            rel_path,
            key,
            checksum_cache: OnceCell::new(),
            size_cache: OnceCell::new(),
        }))
    }

    async fn record_checksum(&self, path: &RelPath, checksum: Checksum) -> StoreResult<()> {
        self.state.manifest.lock().await.record(path, checksum);
        Ok(())
    }

    async fn flush_manifest(&self) -> StoreResult<()> {
        self.state.flush().await
    }

    async fn pending_updates(&self) -> usize {
        self.state.manifest.lock().await.pending_len()
    }
}

struct RemoteEntry {
    dir: Arc<RemoteDirState>,
    rel_path: RelPath,
    key: String,
    checksum_cache: OnceCell<Checksum>,
    size_cache: OnceCell<u64>,
}

impl RemoteEntry {
    fn name(&self) -> &str {
        // Entries are always created by joining a name, never at the root.
        self.rel_path.file_name().unwrap_or_default()
    }

    /// Second stage of checksum migration: read a legacy side-car object,
    /// then delete it so the manifest becomes the single source of truth.
    async fn sidecar_checksum(&self) -> StoreResult<Option<Checksum>> {
        let sidecar_key = format!("{}{}", self.key, SIDECAR_SUFFIX);
        let bytes = match self.dir.store.get(&sidecar_key).await {
            Ok(bytes) => bytes,
            Err(StoreError::NotFound { .. }) => return Ok(None),
            Err(err) => return Err(err),
        };

        let digest = String::from_utf8_lossy(&bytes);
        let checksum = match Checksum::new(digest.trim().to_string()) {
            Ok(checksum) => checksum,
            Err(err) => {
                warn!(path = %self.rel_path, %err, "Ignoring malformed checksum side-car");
                return Ok(None);
            }
        };

        // Best effort: a side-car that survives deletion is re-read and
        // re-deleted next run, never wrong.
        if let Err(err) = self.dir.store.delete(&sidecar_key).await {
            warn!(path = %self.rel_path, %err, "Failed to delete checksum side-car");
        }
        Ok(Some(checksum))
    }

    /// Last stage of checksum migration: download and hash the object.
    async fn fetch_and_hash(&self) -> StoreResult<Checksum> {
        debug!(path = %self.rel_path, "No stored checksum, fetching object to hash");
        let staging = StagingFile::create()
            .map_err(|err| StoreError::transient(format!("create staging file: {err}")))?;
        self.dir.store.download(&self.key, staging.path()).await?;
        checksum_file(staging.path())
            .map_err(|err| StoreError::transient(format!("hash fetched object: {err}")))
    }
}

#[async_trait]
impl IStorageEntry for RemoteEntry {
    fn rel_path(&self) -> &RelPath {
        &self.rel_path
    }

    async fn exists(&self) -> StoreResult<bool> {
        Ok(self.dir.index.contains(&self.rel_path) || self.dir.subdirs.contains(self.name()))
    }

    async fn kind(&self) -> StoreResult<EntryKind> {
        if self.dir.subdirs.contains(self.name()) {
            Ok(EntryKind::Directory)
        } else {
            Ok(EntryKind::File)
        }
    }

    async fn size(&self) -> StoreResult<u64> {
        self.size_cache
            .get_or_try_init(|| async {
                let meta = self.dir.store.head(&self.key).await?;
                Ok(meta.size)
            })
            .await
            .copied()
    }

    async fn checksum(&self) -> StoreResult<Checksum> {
        self.checksum_cache
            .get_or_try_init(|| async {
                if let Some(known) = self.dir.manifest.lock().await.lookup(&self.rel_path) {
                    return Ok(known.clone());
                }

                let migrated = match self.sidecar_checksum().await? {
                    Some(checksum) => checksum,
                    None => self.fetch_and_hash().await?,
                };
                self.dir
                    .record_and_flush(&self.rel_path, migrated.clone())
                    .await?;
                Ok(migrated)
            })
            .await
            .cloned()
    }

    async fn fetch(&self) -> StoreResult<StagingFile> {
        let staging = StagingFile::create()
            .map_err(|err| StoreError::transient(format!("create staging file: {err}")))?;
        self.dir.store.download(&self.key, staging.path()).await?;
        Ok(staging)
    }

    async fn store(&self, local: &Path) -> StoreResult<()> {
        self.dir.store.upload(&self.key, local).await
    }

    fn local_source_path(&self) -> Option<PathBuf> {
        None
    }
}
