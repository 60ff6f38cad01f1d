//! SyncSession domain entity
//!
//! A [`SyncSession`] is threaded through the recursive walk and carries the
//! transfer budget plus all running totals. It replaces process-wide
//! mutable counters: two sessions can run side by side without sharing
//! state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier for a sync session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Create a new random SessionId
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single entry that failed after retry exhaustion.
///
/// Failures never stop the walk (unless permanent); they are collected
/// here and reported at the end of the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionFailure {
    /// Full relative path of the entry that failed
    pub path: String,
    /// Human-readable failure description
    pub message: String,
    /// When the failure was recorded
    pub timestamp: DateTime<Utc>,
}

/// State of one synchronization run.
#[derive(Debug, Clone)]
pub struct SyncSession {
    id: SessionId,
    started_at: DateTime<Utc>,
    /// Ceiling on cumulative uploaded bytes; `None` means unlimited.
    budget: Option<u64>,
    bytes_uploaded: u64,
    /// Bytes now stored at the destination as a result of this run
    /// (reporting only).
    destination_bytes: u64,
    files_considered: u64,
    files_uploaded: u64,
    files_skipped: u64,
    mismatches: u64,
    failures: Vec<SessionFailure>,
}

impl SyncSession {
    /// Starts a new session with an optional transfer budget in bytes.
    pub fn new(budget: Option<u64>) -> Self {
        Self {
            id: SessionId::new(),
            started_at: Utc::now(),
            budget,
            bytes_uploaded: 0,
            destination_bytes: 0,
            files_considered: 0,
            files_uploaded: 0,
            files_skipped: 0,
            mismatches: 0,
            failures: Vec::new(),
        }
    }

    /// The session identifier.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// When the session started.
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Records that a source file was examined.
    pub fn record_considered(&mut self) {
        self.files_considered += 1;
    }

    /// Records that a file was skipped (already present, checksum match
    /// or verification disabled).
    pub fn record_skipped(&mut self) {
        self.files_skipped += 1;
    }

    /// Records a checksum mismatch on an existing destination file.
    /// Mismatches are reported, then overwritten; they are not errors.
    pub fn record_mismatch(&mut self) {
        self.mismatches += 1;
    }

    /// Records a completed transfer of `bytes`.
    pub fn record_uploaded(&mut self, bytes: u64) {
        self.files_uploaded += 1;
        self.bytes_uploaded += bytes;
        self.destination_bytes += bytes;
    }

    /// Records an entry that failed after retry exhaustion.
    pub fn record_failure(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.failures.push(SessionFailure {
            path: path.into(),
            message: message.into(),
            timestamp: Utc::now(),
        });
    }

    /// Returns true once cumulative uploaded bytes exceed the budget.
    /// Checked between entries, never mid-transfer: an in-flight transfer
    /// always completes before the walk can halt.
    pub fn budget_exhausted(&self) -> bool {
        match self.budget {
            Some(budget) => self.bytes_uploaded > budget,
            None => false,
        }
    }

    /// Configured budget ceiling, if any.
    pub fn budget(&self) -> Option<u64> {
        self.budget
    }

    /// Cumulative bytes uploaded this session.
    pub fn bytes_uploaded(&self) -> u64 {
        self.bytes_uploaded
    }

    /// Bytes stored at the destination by this session (reporting).
    pub fn destination_bytes(&self) -> u64 {
        self.destination_bytes
    }

    /// Number of files examined.
    pub fn files_considered(&self) -> u64 {
        self.files_considered
    }

    /// Number of files transferred.
    pub fn files_uploaded(&self) -> u64 {
        self.files_uploaded
    }

    /// Number of files skipped.
    pub fn files_skipped(&self) -> u64 {
        self.files_skipped
    }

    /// Number of checksum mismatches detected.
    pub fn mismatches(&self) -> u64 {
        self.mismatches
    }

    /// Entries that failed after retry exhaustion.
    pub fn failures(&self) -> &[SessionFailure] {
        &self.failures
    }
}
