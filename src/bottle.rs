//! Bottle configuration and the install ledger.
//!
//! Every bottle directory carries a `bottle.yml` describing the
//! environment plus the two ledger fields this engine owns: the ordered
//! list of installed dependencies and the per-dependency uninstaller
//! references. Saves are atomic so a crash never leaves a half-written
//! config behind.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name of the per-bottle configuration.
pub const BOTTLE_CONFIG: &str = "bottle.yml";

/// Ledger sentinel for dependencies that cannot be cleanly removed.
pub const NO_UNINSTALLER: &str = "NO_UNINSTALLER";

#[derive(Error, Debug)]
pub enum BottleError {
    #[error("cannot read bottle config '{path}': {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid bottle config '{path}': {source}")]
    Parse {
        path: String,
        source: serde_yaml::Error,
    },
    #[error("cannot write bottle config '{path}': {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },
}

/// Persistent state of one bottle.
///
/// Key names keep the historical PascalCase (and one snake-ish stray)
/// found in configs in the wild, so existing bottles load unchanged.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct BottleConfig {
    pub name: String,
    pub path: PathBuf,
    /// When set, a state snapshot is taken before each install.
    #[serde(default)]
    pub versioning: bool,
    /// Names of installed dependencies, in install order.
    #[serde(default, rename = "Installed_Dependencies")]
    pub installed_dependencies: Vec<String>,
    /// Dependency name to uninstaller reference. The reference is either
    /// the display name of an uninstaller entry or [`NO_UNINSTALLER`].
    #[serde(default)]
    pub uninstallers: BTreeMap<String, String>,
}

impl BottleConfig {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> BottleConfig {
        BottleConfig {
            name: name.into(),
            path: path.into(),
            versioning: false,
            installed_dependencies: Vec::new(),
            uninstallers: BTreeMap::new(),
        }
    }

    /// Load the config stored in a bottle directory.
    pub fn load(bottle_dir: &Path) -> Result<BottleConfig, BottleError> {
        let path = bottle_dir.join(BOTTLE_CONFIG);
        let text = std::fs::read_to_string(&path).map_err(|e| BottleError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        serde_yaml::from_str(&text).map_err(|e| BottleError::Parse {
            path: path.display().to_string(),
            source: e,
        })
    }

    /// Persist the config into the bottle directory.
    ///
    /// Writes to a temp file in the same directory, syncs, then renames
    /// over the old config, so readers always see a complete document.
    pub fn save(&self) -> Result<(), BottleError> {
        let path = self.path.join(BOTTLE_CONFIG);
        let text = serde_yaml::to_string(self).map_err(|e| BottleError::Parse {
            path: path.display().to_string(),
            source: e,
        })?;

        let temp_path = self
            .path
            .join(format!(".{}.tmp.{}", BOTTLE_CONFIG, std::process::id()));

        let write = |temp_path: &Path| -> std::io::Result<()> {
            let mut file = std::fs::File::create(temp_path)?;
            file.write_all(text.as_bytes())?;
            file.sync_all()?;
            std::fs::rename(temp_path, &path)
        };

        write(&temp_path).map_err(|e| {
            let _ = std::fs::remove_file(&temp_path);
            BottleError::Write {
                path: path.display().to_string(),
                source: e,
            }
        })
    }

    /// The bottle's simulated C: drive.
    pub fn drive_c(&self) -> PathBuf {
        self.path.join("drive_c")
    }

    pub fn system32(&self) -> PathBuf {
        self.drive_c().join("windows/system32")
    }

    pub fn fonts_dir(&self) -> PathBuf {
        self.drive_c().join("windows/Fonts")
    }

    /// Record a dependency as installed. Appends only when absent;
    /// returns whether the list changed.
    pub fn record_installed(&mut self, dependency: &str) -> bool {
        if self.is_installed(dependency) {
            return false;
        }
        self.installed_dependencies.push(dependency.to_string());
        true
    }

    pub fn is_installed(&self, dependency: &str) -> bool {
        self.installed_dependencies.iter().any(|d| d == dependency)
    }

    /// Record the uninstaller reference for a dependency, replacing any
    /// previous one.
    pub fn record_uninstaller(&mut self, dependency: &str, reference: impl Into<String>) {
        self.uninstallers
            .insert(dependency.to_string(), reference.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn bottle_in(dir: &TempDir) -> BottleConfig {
        BottleConfig::new("testing", dir.path())
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = TempDir::new().unwrap();
        let mut config = bottle_in(&dir);
        config.record_installed("dotnet48");
        config.record_uninstaller("dotnet48", "Microsoft .NET Framework 4.8");
        config.save().unwrap();

        let loaded = BottleConfig::load(dir.path()).unwrap();
        assert_eq!(loaded.name, "testing");
        assert_eq!(loaded.installed_dependencies, vec!["dotnet48"]);
        assert_eq!(
            loaded.uninstallers.get("dotnet48").map(String::as_str),
            Some("Microsoft .NET Framework 4.8")
        );
    }

    #[test]
    fn test_historical_key_names_accepted() {
        let dir = TempDir::new().unwrap();
        let yaml = format!(
            r#"
Name: legacy
Path: {}
Versioning: true
Installed_Dependencies:
  - vcredist2013
Uninstallers:
  vcredist2013: NO_UNINSTALLER
"#,
            dir.path().display()
        );
        std::fs::write(dir.path().join(BOTTLE_CONFIG), yaml).unwrap();

        let config = BottleConfig::load(dir.path()).unwrap();
        assert!(config.versioning);
        assert!(config.is_installed("vcredist2013"));
        assert_eq!(
            config.uninstallers.get("vcredist2013").map(String::as_str),
            Some(NO_UNINSTALLER)
        );
    }

    #[test]
    fn test_record_installed_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let mut config = bottle_in(&dir);

        assert!(config.record_installed("dxvk"));
        assert!(!config.record_installed("dxvk"));
        assert_eq!(config.installed_dependencies, vec!["dxvk"]);
    }

    #[test]
    fn test_record_uninstaller_replaces() {
        let dir = TempDir::new().unwrap();
        let mut config = bottle_in(&dir);

        config.record_uninstaller("physx", "PhysX Setup");
        config.record_uninstaller("physx", NO_UNINSTALLER);
        assert_eq!(
            config.uninstallers.get("physx").map(String::as_str),
            Some(NO_UNINSTALLER)
        );
    }

    #[test]
    fn test_save_preserves_field_names_on_disk() {
        let dir = TempDir::new().unwrap();
        let mut config = bottle_in(&dir);
        config.record_installed("mono");
        config.save().unwrap();

        let raw = std::fs::read_to_string(dir.path().join(BOTTLE_CONFIG)).unwrap();
        assert!(raw.contains("Installed_Dependencies"));
        assert!(raw.contains("Name"));
    }

    #[test]
    fn test_drive_paths() {
        let config = BottleConfig::new("x", "/bottles/x");
        assert_eq!(config.system32(), PathBuf::from("/bottles/x/drive_c/windows/system32"));
        assert_eq!(config.fonts_dir(), PathBuf::from("/bottles/x/drive_c/windows/Fonts"));
    }
}
