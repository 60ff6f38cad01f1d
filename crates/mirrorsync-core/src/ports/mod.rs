//! Port definitions (trait interfaces for adapters)
//!
//! Ports are the seams of the hexagonal architecture: the sync engine
//! drives storage through [`storage_backend`] and never sees anything more
//! concrete; remote backends drive raw object storage through
//! [`object_store`].

pub mod object_store;
pub mod storage_backend;
