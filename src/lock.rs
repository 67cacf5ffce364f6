//! Per-bottle install locks.
//!
//! Installs mutate a bottle's files and its config, so only one install
//! may run against a bottle at a time. The lock is a file inside the
//! bottle directory held with an exclusive flock; stale locks left by
//! crashed processes are cleaned up by age.

use crate::bottle::BottleConfig;
use fs2::FileExt;
use std::fs::File;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name of the lock inside a bottle directory.
const LOCK_FILE: &str = ".install.lock";

/// How old a lock file can be before it's considered stale (2 hours)
const STALE_LOCK_AGE_SECS: u64 = 7200;

#[derive(Error, Debug)]
pub enum LockError {
    #[error("cannot create lock file '{path}': {source}")]
    Create {
        path: String,
        source: std::io::Error,
    },
    #[error(
        "bottle '{name}' already has an install in progress; \
         if that is wrong, delete '{path}'"
    )]
    Held { name: String, path: String },
}

fn is_stale_lock(lock_path: &Path) -> bool {
    if let Ok(metadata) = std::fs::metadata(lock_path)
        && let Ok(modified) = metadata.modified()
        && let Ok(age) = std::time::SystemTime::now().duration_since(modified)
    {
        return age.as_secs() > STALE_LOCK_AGE_SECS;
    }
    false
}

/// Acquire the install lock of a bottle. The returned guard holds the
/// lock until dropped.
pub fn acquire_bottle_lock(bottle: &BottleConfig) -> Result<BottleLock, LockError> {
    let lock_path = bottle.path.join(LOCK_FILE);

    if lock_path.exists() && is_stale_lock(&lock_path) {
        let _ = std::fs::remove_file(&lock_path);
    }

    let lock_file = File::create(&lock_path).map_err(|e| LockError::Create {
        path: lock_path.display().to_string(),
        source: e,
    })?;

    if lock_file.try_lock_exclusive().is_err() {
        return Err(LockError::Held {
            name: bottle.name.clone(),
            path: lock_path.display().to_string(),
        });
    }

    Ok(BottleLock {
        _file: lock_file,
        path: lock_path,
    })
}

/// RAII guard; releases the lock and removes the lock file on drop.
#[derive(Debug)]
pub struct BottleLock {
    _file: File,
    path: PathBuf,
}

impl Drop for BottleLock {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}
