//! Incremental synchronization engine
//!
//! The [`SyncEngine`] walks the source tree depth-first and makes the
//! destination catch up: files that are absent or content-divergent at the
//! destination are transferred, everything else is skipped. Both sides are
//! driven through the storage capability contract, so the engine never
//! branches on whether a side is a local directory or a remote container.
//!
//! ## Walk flow
//!
//! 1. Open the directory scope on both backends (for a remote side this
//!    loads the manifest and builds the existence index).
//! 2. For each source entry: skip bookkeeping names and symlinks, recurse
//!    into directories, checksum-gate and transfer files.
//! 3. Flush the destination manifest before leaving the scope.
//!
//! ## Failure policy
//!
//! Transient failures are retried a bounded number of times; an entry that
//! still fails is recorded on the session and the walk continues. A
//! permanent failure aborts the whole run.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use mirrorsync_core::config::SyncConfig;
use mirrorsync_core::domain::manifest::is_internal_name;
use mirrorsync_core::domain::newtypes::RelPath;
use mirrorsync_core::domain::session::SyncSession;
use mirrorsync_core::error::StoreResult;
use mirrorsync_core::ports::storage_backend::{
    EntryKind, IStorageBackend, IStorageDirectory, IStorageEntry,
};

use crate::report::SyncReport;
use crate::retry::{with_retry, RetryPolicy};

// ============================================================================
// SyncOptions
// ============================================================================

/// Tuning knobs for one engine instance.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Ceiling on cumulative transferred bytes; `None` means unlimited.
    /// The walk halts gracefully once the ceiling is strictly exceeded.
    pub budget: Option<u64>,
    /// When false, any file already present at the destination is skipped
    /// without comparing checksums.
    pub verify_checksums: bool,
    /// Flush the destination manifest once this many updates are pending.
    pub batch_max_pending: usize,
    /// Flush the destination manifest after any single transfer larger
    /// than this many bytes.
    pub batch_flush_bytes: u64,
    /// Retry policy for network-sensitive operations.
    pub retry: RetryPolicy,
}

impl SyncOptions {
    pub fn from_config(config: &SyncConfig) -> Self {
        Self {
            budget: config.budget_bytes,
            verify_checksums: true,
            batch_max_pending: config.batch_max_pending,
            batch_flush_bytes: config.batch_flush_bytes,
            retry: RetryPolicy::from_config(config),
        }
    }
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self::from_config(&SyncConfig::default())
    }
}

// ============================================================================
// SyncEngine
// ============================================================================

/// Result of walking one directory scope.
enum WalkOutcome {
    /// The scope was fully processed.
    Completed,
    /// The transfer budget was exceeded; unwind without visiting more
    /// entries.
    BudgetExhausted,
}

/// Result of processing one source file.
enum FileOutcome {
    Skipped,
    Uploaded,
}

/// One-way incremental synchronization engine.
///
/// ## Dependencies
///
/// - `source`: the side being mirrored (read-only during the run)
/// - `destination`: the side being written (files and manifests)
pub struct SyncEngine {
    source: Arc<dyn IStorageBackend>,
    destination: Arc<dyn IStorageBackend>,
    options: SyncOptions,
}

impl SyncEngine {
    pub fn new(
        source: Arc<dyn IStorageBackend>,
        destination: Arc<dyn IStorageBackend>,
        options: SyncOptions,
    ) -> Self {
        Self {
            source,
            destination,
            options,
        }
    }

    /// Runs one synchronization pass over the subtree rooted at `path`
    /// (the container root when `path` is the root).
    ///
    /// Per-entry failures are collected on the report; only a permanent
    /// failure surfaces as `Err`.
    pub async fn synchronize(&self, path: &RelPath) -> StoreResult<SyncReport> {
        let mut session = SyncSession::new(self.options.budget);
        info!(
            session = %session.id(),
            path = %path,
            budget = ?session.budget(),
            "Starting synchronization run"
        );

        let outcome = self.sync_directory(path.clone(), &mut session).await?;
        let budget_exhausted = matches!(outcome, WalkOutcome::BudgetExhausted);

        info!(
            session = %session.id(),
            uploaded = session.files_uploaded(),
            skipped = session.files_skipped(),
            mismatches = session.mismatches(),
            bytes = session.bytes_uploaded(),
            failures = session.failures().len(),
            budget_exhausted,
            "Synchronization run finished"
        );
        Ok(SyncReport::from_session(&session, budget_exhausted))
    }

    /// Recursive directory walk. Boxed because async recursion needs an
    /// indirection for the future type.
    fn sync_directory<'a>(
        &'a self,
        path: RelPath,
        session: &'a mut SyncSession,
    ) -> Pin<Box<dyn Future<Output = StoreResult<WalkOutcome>> + Send + 'a>> {
        Box::pin(async move {
            let src_dir = match self.source.open_directory(&path).await {
                Ok(dir) => dir,
                Err(err) if err.is_permanent() => return Err(err),
                Err(err) => {
                    error!(dir = %path, %err, "Failed to open source directory, skipping subtree");
                    session.record_failure(path.as_str(), err.to_string());
                    return Ok(WalkOutcome::Completed);
                }
            };
            let dest_dir = match self.destination.open_directory(&path).await {
                Ok(dir) => dir,
                Err(err) if err.is_permanent() => return Err(err),
                Err(err) => {
                    error!(dir = %path, %err, "Failed to open destination directory, skipping subtree");
                    session.record_failure(path.as_str(), err.to_string());
                    return Ok(WalkOutcome::Completed);
                }
            };

            let mut names = match src_dir.list_entries().await {
                Ok(names) => names,
                Err(err) if err.is_permanent() => return Err(err),
                Err(err) => {
                    error!(dir = %path, %err, "Failed to list source directory, skipping subtree");
                    session.record_failure(path.as_str(), err.to_string());
                    return Ok(WalkOutcome::Completed);
                }
            };
            // Listing order is not contractual; sort for a deterministic
            // walk and stable reporting.
            names.sort();
            debug!(dir = %path, entries = names.len(), "Walking directory");

            for name in names {
                if is_internal_name(&name) {
                    debug!(dir = %path, %name, "Skipping bookkeeping entry");
                    continue;
                }
                let child = match path.join(&name) {
                    Ok(child) => child,
                    Err(err) => {
                        warn!(dir = %path, %name, %err, "Skipping entry with invalid name");
                        continue;
                    }
                };

                let src_entry = match src_dir.entry(&name).await {
                    Ok(entry) => entry,
                    Err(err) if err.is_permanent() => return Err(err),
                    Err(err) => {
                        session.record_failure(child.as_str(), err.to_string());
                        continue;
                    }
                };
                let kind = match src_entry.kind().await {
                    Ok(kind) => kind,
                    Err(err) if err.is_permanent() => return Err(err),
                    Err(err) => {
                        error!(path = %child, %err, "Failed to stat entry");
                        session.record_failure(child.as_str(), err.to_string());
                        continue;
                    }
                };

                match kind {
                    EntryKind::Symlink => {
                        debug!(path = %child, "Skipping symlink");
                    }
                    EntryKind::Directory => {
                        if let WalkOutcome::BudgetExhausted =
                            self.sync_directory(child, session).await?
                        {
                            self.flush_directory(dest_dir.as_ref(), session).await?;
                            return Ok(WalkOutcome::BudgetExhausted);
                        }
                    }
                    EntryKind::File => {
                        match self
                            .sync_file(src_entry.as_ref(), dest_dir.as_ref(), session)
                            .await
                        {
                            Ok(_) => {}
                            Err(err) if err.is_permanent() => return Err(err),
                            Err(err) => {
                                error!(path = %child, %err, "Entry failed after retries");
                                session.record_failure(child.as_str(), err.to_string());
                                continue;
                            }
                        }
                        if session.budget_exhausted() {
                            warn!(
                                bytes = session.bytes_uploaded(),
                                budget = ?session.budget(),
                                "Transfer budget exceeded, halting walk"
                            );
                            self.flush_directory(dest_dir.as_ref(), session).await?;
                            return Ok(WalkOutcome::BudgetExhausted);
                        }
                    }
                }
            }

            self.flush_directory(dest_dir.as_ref(), session).await?;
            Ok(WalkOutcome::Completed)
        })
    }

    /// Processes one source file: checksum-gate against the destination,
    /// transfer when needed, record the checksum for the manifest.
    async fn sync_file(
        &self,
        src_entry: &dyn IStorageEntry,
        dest_dir: &dyn IStorageDirectory,
        session: &mut SyncSession,
    ) -> StoreResult<FileOutcome> {
        session.record_considered();
        let path = src_entry.rel_path().clone();
        // Entries are created by joining a name onto a directory, so a
        // file path always has a final component.
        let name = path.file_name().unwrap_or_default();
        let dest_entry = dest_dir.entry(name).await?;

        let retry = &self.options.retry;
        let mut src_checksum = None;

        if dest_entry.exists().await? {
            if !self.options.verify_checksums {
                debug!(path = %path, "Destination entry present, verification disabled");
                session.record_skipped();
                return Ok(FileOutcome::Skipped);
            }

            let source_sum = with_retry(retry, "source checksum", || src_entry.checksum()).await?;
            let dest_sum =
                with_retry(retry, "destination checksum", || dest_entry.checksum()).await?;
            if source_sum == dest_sum {
                debug!(path = %path, checksum = source_sum.short(), "Checksums match, skipping");
                session.record_skipped();
                return Ok(FileOutcome::Skipped);
            }

            // Mismatches are reported and then overwritten: the source is
            // authoritative in a one-way mirror.
            warn!(
                path = %path,
                source = source_sum.short(),
                destination = dest_sum.short(),
                "Checksum mismatch, overwriting destination"
            );
            session.record_mismatch();
            src_checksum = Some(source_sum);
        }

        let size = with_retry(retry, "source size", || src_entry.size()).await?;
        let checksum = match src_checksum {
            Some(checksum) => checksum,
            None => with_retry(retry, "source checksum", || src_entry.checksum()).await?,
        };

        match src_entry.local_source_path() {
            // The source bytes are already on disk: transfer straight from
            // there, no staging copy.
            Some(local) => {
                with_retry(retry, "store", || dest_entry.store(&local)).await?;
            }
            None => {
                let staging = with_retry(retry, "fetch", || src_entry.fetch()).await?;
                with_retry(retry, "store", || dest_entry.store(staging.path())).await?;
            }
        }

        dest_dir.record_checksum(&path, checksum).await?;
        if dest_dir.pending_updates().await > self.options.batch_max_pending
            || size > self.options.batch_flush_bytes
        {
            with_retry(retry, "manifest flush", || dest_dir.flush_manifest()).await?;
        }

        session.record_uploaded(size);
        info!(path = %path, size, "Transferred file");
        Ok(FileOutcome::Uploaded)
    }

    /// Flushes the destination manifest before the walk leaves a scope.
    /// Exhausted retries are recorded, not fatal: the files themselves are
    /// already stored, and the next run re-derives what the manifest lost.
    async fn flush_directory(
        &self,
        dest_dir: &dyn IStorageDirectory,
        session: &mut SyncSession,
    ) -> StoreResult<()> {
        match with_retry(&self.options.retry, "manifest flush", || {
            dest_dir.flush_manifest()
        })
        .await
        {
            Ok(()) => Ok(()),
            Err(err) if err.is_permanent() => Err(err),
            Err(err) => {
                error!(dir = %dest_dir.path(), %err, "Failed to flush manifest");
                session.record_failure(dest_dir.path().as_str(), err.to_string());
                Ok(())
            }
        }
    }
}
