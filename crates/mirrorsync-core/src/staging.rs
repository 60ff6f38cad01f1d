//! Staging files for fetch-then-store transfers
//!
//! When the source backend is remote, its bytes are materialized into a
//! local [`StagingFile`] before being handed to the destination's `store`.
//! The file is deleted on every exit path, success or failure, via RAII;
//! staging files are never shared across concurrent transfers.

use std::io;
use std::path::Path;

use tempfile::{NamedTempFile, TempPath};

/// A local temporary file holding fetched remote bytes.
///
/// Dropping the handle deletes the file.
#[derive(Debug)]
pub struct StagingFile {
    path: TempPath,
}

impl StagingFile {
    /// Creates an empty staging file in the system temp directory.
    pub fn create() -> io::Result<Self> {
        let file = NamedTempFile::new()?;
        Ok(Self {
            path: file.into_temp_path(),
        })
    }

    /// Path of the staging file, valid until the handle is dropped.
    pub fn path(&self) -> &Path {
        &self.path
    }
}
