//! MirrorSync Core - Domain logic and business rules
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain types** - `RelPath`, `Checksum`, `Manifest`, `SyncSession`
//! - **Checksum engine** - streaming SHA-512 content hashing
//! - **Port definitions** - Traits for adapters: `IStorageBackend`,
//!   `IStorageDirectory`, `IStorageEntry`, `IObjectStore`
//! - **Error taxonomy** - `StoreError` with transient/permanent
//!   classification driving the retry policy
//!
//! # Architecture
//!
//! This crate follows the hexagonal (ports & adapters) architecture pattern.
//! The domain module contains pure business logic with no external
//! dependencies. Ports define trait interfaces that the backend crates
//! implement. The sync engine orchestrates domain entities through the
//! port interfaces only; it never branches on backend identity.

pub mod checksum;
pub mod config;
pub mod domain;
pub mod error;
pub mod ports;
pub mod staging;
