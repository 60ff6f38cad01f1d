//! Domain error types
//!
//! This module defines error types specific to domain operations,
//! including validation failures for paths and checksums.

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Invalid relative path format or content
    #[error("Invalid relative path: {0}")]
    InvalidPath(String),

    /// Invalid entry name (empty, or contains a path separator)
    #[error("Invalid entry name: {0}")]
    InvalidName(String),

    /// Invalid checksum format (expected lowercase-hex SHA-512)
    #[error("Invalid checksum format: {0}")]
    InvalidChecksum(String),
}
