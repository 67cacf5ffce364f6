//! File integrity checks.
//!
//! Repository manifests carry SHA256 checksums for downloaded artifacts.
//! Hashing is chunked so large installers never sit in memory whole.

use sha2::{Digest, Sha256};
use std::io::Read;
use std::path::Path;
use thiserror::Error;

/// Chunk size for reading files during hashing (1MB)
const CHUNK_SIZE: usize = 1024 * 1024;

#[derive(Debug, Error)]
pub enum HashError {
    #[error("cannot open '{path}': {source}")]
    Open {
        path: String,
        source: std::io::Error,
    },
    #[error("read error while hashing '{path}': {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("integrity check failed for '{path}'\n  expected: {expected}\n  got:      {actual}")]
    Mismatch {
        path: String,
        expected: String,
        actual: String,
    },
}

/// Compute the lowercase hex SHA256 digest of a file.
pub fn sha256_file(file: &Path) -> Result<String, HashError> {
    let mut f = std::fs::File::open(file).map_err(|e| HashError::Open {
        path: file.display().to_string(),
        source: e,
    })?;

    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; CHUNK_SIZE];
    loop {
        let n = f.read(&mut buffer).map_err(|e| HashError::Read {
            path: file.display().to_string(),
            source: e,
        })?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Verify a file against an expected SHA256 checksum.
///
/// The comparison is case-insensitive on the expected side; manifests in
/// the wild mix cases.
pub fn verify_sha256(file: &Path, expected: &str) -> Result<(), HashError> {
    let actual = sha256_file(file)?;
    let expected = expected.to_lowercase();
    if actual != expected {
        return Err(HashError::Mismatch {
            path: file.display().to_string(),
            expected,
            actual,
        });
    }
    Ok(())
}
