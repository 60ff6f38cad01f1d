//! MirrorSync synchronization engine
//!
//! Drives one-way incremental synchronization between two storage
//! backends: a depth-first walk over the source tree that transfers only
//! files that are absent or content-divergent at the destination, with
//! bounded retries for transient failures and a graceful halt when the
//! transfer budget is exhausted.

pub mod engine;
pub mod report;
pub mod retry;

pub use engine::{SyncEngine, SyncOptions};
pub use report::SyncReport;
pub use retry::RetryPolicy;
