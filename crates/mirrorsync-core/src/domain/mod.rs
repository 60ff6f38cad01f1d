//! Domain entities and value types
//!
//! Pure business types with no I/O: validated newtypes, the per-directory
//! manifest model, and the per-run session that carries the transfer budget
//! and running totals.

pub mod errors;
pub mod manifest;
pub mod newtypes;
pub mod session;

pub use errors::DomainError;
pub use manifest::Manifest;
pub use newtypes::{Checksum, RelPath};
pub use session::SyncSession;
