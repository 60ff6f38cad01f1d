//! Buffered manifest updates shared by both backends.
//!
//! Updates accumulate in a separate pending manifest and are merged into a
//! snapshot at flush time (never mutating a map being iterated). The
//! pending set survives a failed flush so the next flush retries the same
//! updates.

use mirrorsync_core::domain::manifest::Manifest;
use mirrorsync_core::domain::newtypes::{Checksum, RelPath};

/// Current manifest plus the updates buffered since the last flush.
#[derive(Debug)]
pub(crate) struct PendingManifest {
    current: Manifest,
    pending: Manifest,
}

impl PendingManifest {
    pub(crate) fn new(current: Manifest) -> Self {
        Self {
            current,
            pending: Manifest::new(),
        }
    }

    /// Looks up a checksum, preferring a buffered update over the last
    /// flushed value.
    pub(crate) fn lookup(&self, path: &RelPath) -> Option<&Checksum> {
        self.pending.get(path).or_else(|| self.current.get(path))
    }

    /// Buffers one update.
    pub(crate) fn record(&mut self, path: &RelPath, checksum: Checksum) {
        self.pending.insert(path, checksum);
    }

    pub(crate) fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub(crate) fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Snapshot of current-with-pending-applied, for writing.
    pub(crate) fn merged(&self) -> Manifest {
        let mut merged = self.current.clone();
        merged.merge(&self.pending);
        merged
    }

    /// Marks the merged snapshot as durably written.
    pub(crate) fn commit(&mut self) {
        self.current = self.merged();
        self.pending.clear();
    }
}
