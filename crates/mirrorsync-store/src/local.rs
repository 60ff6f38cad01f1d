//! Local filesystem backend
//!
//! Entries map directly onto files under a root directory. Existence is a
//! filesystem stat, checksums are computed by streaming the real bytes
//! (never trusted from a manifest), and `store` is a copy with parent
//! directories created on demand.
//!
//! A local destination still maintains the per-directory `.shalist`
//! manifest so the capability contract is uniform across backends, but
//! the manifest is only ever written, not consulted, on this side.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, warn};

use mirrorsync_core::checksum::checksum_file;
use mirrorsync_core::domain::manifest::{Manifest, MANIFEST_NAME};
use mirrorsync_core::domain::newtypes::{Checksum, RelPath};
use mirrorsync_core::error::{StoreError, StoreResult};
use mirrorsync_core::ports::storage_backend::{
    EntryKind, IStorageBackend, IStorageDirectory, IStorageEntry,
};
use mirrorsync_core::staging::StagingFile;

use crate::pending::PendingManifest;

/// Joins a relative path onto a filesystem root.
fn resolve(root: &Path, path: &RelPath) -> PathBuf {
    let mut abs = root.to_path_buf();
    for component in path.components() {
        abs.push(component);
    }
    abs
}

/// A directory tree on the local filesystem.
pub struct LocalBackend {
    root: PathBuf,
}

impl LocalBackend {
    /// Creates a backend rooted at `root`. The root is not required to
    /// exist yet when the backend is a destination.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl IStorageBackend for LocalBackend {
    async fn open_directory(&self, path: &RelPath) -> StoreResult<Box<dyn IStorageDirectory>> {
        let abs = resolve(&self.root, path);
        let manifest_path = abs.join(MANIFEST_NAME);

        let manifest = match tokio::fs::read_to_string(&manifest_path).await {
            Ok(content) => match Manifest::parse(&content) {
                Ok(manifest) => manifest,
                Err(err) => {
                    warn!(
                        path = %path,
                        %err,
                        "Manifest failed to parse, treating as empty"
                    );
                    Manifest::new()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Manifest::new(),
            Err(err) => {
                return Err(StoreError::transient(format!(
                    "read manifest {}: {err}",
                    manifest_path.display()
                )));
            }
        };

        debug!(path = %path, entries = manifest.len(), "Opened local directory");

        Ok(Box::new(LocalDirectory {
            state: Arc::new(LocalDirState {
                path: path.clone(),
                abs,
                manifest: Mutex::new(PendingManifest::new(manifest)),
            }),
        }))
    }
}

struct LocalDirState {
    path: RelPath,
    abs: PathBuf,
    manifest: Mutex<PendingManifest>,
}

struct LocalDirectory {
    state: Arc<LocalDirState>,
}

#[async_trait]
impl IStorageDirectory for LocalDirectory {
    fn path(&self) -> &RelPath {
        &self.state.path
    }

    async fn list_entries(&self) -> StoreResult<Vec<String>> {
        let mut reader = tokio::fs::read_dir(&self.state.abs).await.map_err(|err| {
            StoreError::transient(format!("list {}: {err}", self.state.abs.display()))
        })?;

        let mut names = Vec::new();
        loop {
            let entry = reader.next_entry().await.map_err(|err| {
                StoreError::transient(format!("list {}: {err}", self.state.abs.display()))
            })?;
            let Some(entry) = entry else { break };
            match entry.file_name().into_string() {
                Ok(name) => names.push(name),
                Err(name) => {
                    warn!(dir = %self.state.path, ?name, "Skipping non-UTF-8 entry name");
                }
            }
        }
        Ok(names)
    }

    async fn entry(&self, name: &str) -> StoreResult<Box<dyn IStorageEntry>> {
        let rel_path = self
            .state
            .path
            .join(name)
            .map_err(|err| StoreError::permanent(err.to_string()))?;
        let abs = self.state.abs.join(name);
        Ok(Box::new(LocalEntry {
            rel_path,
            abs,
            checksum_cache: OnceCell::new(),
            size_cache: OnceCell::new(),
        }))
    }

    async fn record_checksum(&self, path: &RelPath, checksum: Checksum) -> StoreResult<()> {
        self.state.manifest.lock().await.record(path, checksum);
        Ok(())
    }

    async fn flush_manifest(&self) -> StoreResult<()> {
        let mut state = self.state.manifest.lock().await;
        if !state.has_pending() {
            return Ok(());
        }

        let merged = state.merged();
        let manifest_path = self.state.abs.join(MANIFEST_NAME);

        // Full overwrite via temp file + rename so readers never observe a
        // half-written manifest.
        let write = || -> std::io::Result<()> {
            let mut file = tempfile::NamedTempFile::new_in(&self.state.abs)?;
            std::io::Write::write_all(&mut file, merged.to_json().as_bytes())?;
            file.persist(&manifest_path).map_err(|err| err.error)?;
            Ok(())
        };
        write().map_err(|err| {
            StoreError::transient(format!(
                "write manifest {}: {err}",
                manifest_path.display()
            ))
        })?;

        debug!(
            dir = %self.state.path,
            entries = merged.len(),
            "Flushed local manifest"
        );
        state.commit();
        Ok(())
    }

    async fn pending_updates(&self) -> usize {
        self.state.manifest.lock().await.pending_len()
    }
}

struct LocalEntry {
    rel_path: RelPath,
    abs: PathBuf,
    checksum_cache: OnceCell<Checksum>,
    size_cache: OnceCell<u64>,
}

#[async_trait]
impl IStorageEntry for LocalEntry {
    fn rel_path(&self) -> &RelPath {
        &self.rel_path
    }

    async fn exists(&self) -> StoreResult<bool> {
        match tokio::fs::symlink_metadata(&self.abs).await {
            Ok(_) => Ok(true),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(StoreError::transient(format!(
                "stat {}: {err}",
                self.abs.display()
            ))),
        }
    }

    async fn kind(&self) -> StoreResult<EntryKind> {
        let metadata = tokio::fs::symlink_metadata(&self.abs).await.map_err(|err| {
            StoreError::transient(format!("stat {}: {err}", self.abs.display()))
        })?;
        if metadata.file_type().is_symlink() {
            Ok(EntryKind::Symlink)
        } else if metadata.is_dir() {
            Ok(EntryKind::Directory)
        } else {
            Ok(EntryKind::File)
        }
    }

    async fn size(&self) -> StoreResult<u64> {
        self.size_cache
            .get_or_try_init(|| async {
                let metadata = tokio::fs::metadata(&self.abs).await.map_err(|err| {
                    StoreError::transient(format!("stat {}: {err}", self.abs.display()))
                })?;
                Ok(metadata.len())
            })
            .await
            .copied()
    }

    async fn checksum(&self) -> StoreResult<Checksum> {
        self.checksum_cache
            .get_or_try_init(|| async {
                checksum_file(&self.abs).map_err(|err| {
                    StoreError::transient(format!("hash {}: {err}", self.abs.display()))
                })
            })
            .await
            .cloned()
    }

    async fn fetch(&self) -> StoreResult<StagingFile> {
        let staging = StagingFile::create()
            .map_err(|err| StoreError::transient(format!("create staging file: {err}")))?;
        tokio::fs::copy(&self.abs, staging.path())
            .await
            .map_err(|err| {
                StoreError::transient(format!("fetch {}: {err}", self.abs.display()))
            })?;
        Ok(staging)
    }

    async fn store(&self, local: &Path) -> StoreResult<()> {
        if let Some(parent) = self.abs.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|err| {
                StoreError::transient(format!("mkdir {}: {err}", parent.display()))
            })?;
        }
        tokio::fs::copy(local, &self.abs).await.map_err(|err| {
            StoreError::transient(format!("store {}: {err}", self.abs.display()))
        })?;
        Ok(())
    }

    fn local_source_path(&self) -> Option<PathBuf> {
        Some(self.abs.clone())
    }
}
