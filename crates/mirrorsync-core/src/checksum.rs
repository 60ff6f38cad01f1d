//! Checksum engine
//!
//! Streams file content through SHA-512 in fixed-size chunks so that
//! arbitrarily large files never have to fit in memory. The digest is a
//! deterministic, pure function of byte content.
//!
//! Hashing is treated as a blocking operation (suspension points are
//! network calls only); callers on an async runtime hash local files
//! directly.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use sha2::{Digest, Sha512};

use crate::domain::newtypes::Checksum;

/// Chunk size for streaming reads (1 MiB).
const CHUNK_SIZE: usize = 1024 * 1024;

/// Computes the SHA-512 checksum of a file by streaming its content.
pub fn checksum_file(path: &Path) -> io::Result<Checksum> {
    let mut file = File::open(path)?;
    let mut hasher = Sha512::new();
    let mut buffer = vec![0u8; CHUNK_SIZE];
    loop {
        let read = file.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    Ok(Checksum::from_valid_hex(hex::encode(hasher.finalize())))
}

/// Computes the SHA-512 checksum of an in-memory payload.
///
/// Only for payloads already resident in memory (manifest-sized); file
/// content goes through [`checksum_file`].
pub fn checksum_bytes(data: &[u8]) -> Checksum {
    let mut hasher = Sha512::new();
    hasher.update(data);
    Checksum::from_valid_hex(hex::encode(hasher.finalize()))
}
