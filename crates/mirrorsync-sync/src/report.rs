//! Run summary reporting

use chrono::Utc;
use std::time::Duration;

use mirrorsync_core::domain::session::{SessionFailure, SessionId, SyncSession};

/// Summary of a completed synchronization run.
#[derive(Debug, Clone)]
pub struct SyncReport {
    /// Identifier of the session that produced this report
    pub session_id: SessionId,
    /// Number of source files examined
    pub files_considered: u64,
    /// Number of files transferred
    pub files_uploaded: u64,
    /// Number of files skipped (already present and matching)
    pub files_skipped: u64,
    /// Checksum mismatches detected (and overwritten)
    pub mismatches: u64,
    /// Cumulative bytes transferred
    pub bytes_uploaded: u64,
    /// Bytes now stored at the destination as a result of this run
    pub destination_bytes: u64,
    /// Entries that failed after retry exhaustion (non-fatal)
    pub failures: Vec<SessionFailure>,
    /// Whether the run halted because the transfer budget was exceeded
    pub budget_exhausted: bool,
    /// Wall-clock duration of the run
    pub duration: Duration,
}

impl SyncReport {
    /// Builds the report from a finished session.
    pub fn from_session(session: &SyncSession, budget_exhausted: bool) -> Self {
        let elapsed = (Utc::now() - session.started_at())
            .to_std()
            .unwrap_or(Duration::ZERO);
        Self {
            session_id: session.id(),
            files_considered: session.files_considered(),
            files_uploaded: session.files_uploaded(),
            files_skipped: session.files_skipped(),
            mismatches: session.mismatches(),
            bytes_uploaded: session.bytes_uploaded(),
            destination_bytes: session.destination_bytes(),
            failures: session.failures().to_vec(),
            budget_exhausted,
            duration: elapsed,
        }
    }

    /// Returns true if any entry failed during the run.
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}
