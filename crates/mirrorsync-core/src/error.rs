//! Storage failure taxonomy
//!
//! Every fallible backend operation returns a [`StoreError`] classified as
//! transient (retryable), permanent (aborts the run), or not-found (absence
//! of an object where absence is meaningful, such as a manifest or a legacy
//! checksum side-car).
//!
//! ## Design Notes
//!
//! - Classification happens at the adapter boundary, where the failure is
//!   actually understood (HTTP status, I/O error kind). Callers branch on
//!   the variant, never on message contents.
//! - `NotFound` is deliberately separate from `Permanent`: a missing
//!   manifest means "nothing known yet", not a broken run.

use thiserror::Error;

/// Result alias for backend operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Failure of a storage backend operation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Temporary failure (network timeout, rate limit, 5xx). Safe to retry.
    #[error("transient I/O failure: {message}")]
    Transient {
        /// Human-readable description of what failed
        message: String,
    },

    /// Unrecoverable failure (authentication rejection, malformed response,
    /// missing container that cannot be created). Never retried; aborts the
    /// whole run.
    #[error("permanent I/O failure: {message}")]
    Permanent {
        /// Human-readable description of what failed
        message: String,
    },

    /// The named object does not exist at the backend.
    #[error("object not found: {key}")]
    NotFound {
        /// The key or path that was requested
        key: String,
    },
}

impl StoreError {
    /// Builds a transient (retryable) failure.
    pub fn transient(message: impl Into<String>) -> Self {
        Self::Transient {
            message: message.into(),
        }
    }

    /// Builds a permanent (run-aborting) failure.
    pub fn permanent(message: impl Into<String>) -> Self {
        Self::Permanent {
            message: message.into(),
        }
    }

    /// Builds a not-found failure for the given key.
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Returns true if the operation may be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }

    /// Returns true if this failure must abort the whole run.
    pub fn is_permanent(&self) -> bool {
        matches!(self, Self::Permanent { .. })
    }
}
