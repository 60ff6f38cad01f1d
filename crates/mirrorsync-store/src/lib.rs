//! MirrorSync storage backends
//!
//! Implementations of the `IStorageBackend` capability contract:
//!
//! - [`LocalBackend`] - a directory tree on the local filesystem
//! - [`RemoteBackend`] - a flat-namespace object-store container, layered
//!   on any `IObjectStore` adapter
//! - [`memory::InMemoryObjectStore`] - an in-process object store used as
//!   a test double
//!
//! Both backends maintain the same per-directory `.shalist` manifest, so
//! the sync engine sees one capability surface regardless of which side
//! is local.

pub mod local;
pub mod memory;
pub mod remote;

mod pending;

pub use local::LocalBackend;
pub use remote::RemoteBackend;
