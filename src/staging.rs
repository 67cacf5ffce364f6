//! Per-install staging directories.
//!
//! Every install invocation gets a fresh directory under the temp root,
//! named after the dependency with a unique suffix, so two concurrent
//! installs can never collide on a downloaded file name. Raw downloads
//! land in a `downloads/` subdirectory; extraction directories sit at
//! the staging root, where steps address them with `temp/<name>` paths.
//! The whole tree is removed when the staging handle is dropped.

use std::io;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Prefix marking step source locations that refer to staged artifacts
/// rather than remote URLs.
const STAGED_PREFIX: &str = "temp/";

/// A staging directory scoped to one install invocation.
#[derive(Debug)]
pub struct Staging {
    dir: TempDir,
    downloads: PathBuf,
}

impl Staging {
    /// Create a staging directory for `dependency` under `temp_root`.
    pub fn create(temp_root: &Path, dependency: &str) -> io::Result<Staging> {
        std::fs::create_dir_all(temp_root)?;
        let dir = tempfile::Builder::new()
            .prefix(&format!("{}-", dependency))
            .tempdir_in(temp_root)?;
        let downloads = dir.path().join("downloads");
        std::fs::create_dir(&downloads)?;
        Ok(Staging { dir, downloads })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Where fetched artifacts are stored. Kept apart from the staging
    /// root so a cabinet named `setup.exe` never blocks creation of an
    /// extraction directory named `setup.exe`.
    pub fn downloads(&self) -> &Path {
        &self.downloads
    }

    pub fn join(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Resolve a `temp/<rest>` source to its path inside this staging
    /// directory. Returns `None` for anything else, remote URLs
    /// included.
    pub fn resolve(&self, source: &str) -> Option<PathBuf> {
        source
            .strip_prefix(STAGED_PREFIX)
            .map(|rest| self.dir.path().join(rest))
    }
}
