//! Filesystem roots used by the installer.
//!
//! Bottles live under a single root directory, one subdirectory per
//! bottle. Staging directories for in-flight installs are created under
//! a separate temp root. Both roots follow XDG conventions and can be
//! overridden through environment variables.

use std::path::{Path, PathBuf};

/// Resolved root directories for an installer run.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Directory containing one subdirectory per bottle.
    pub bottles: PathBuf,
    /// Root under which per-install staging directories are created.
    pub temp: PathBuf,
}

impl Paths {
    /// Resolve roots from the environment, falling back to XDG defaults.
    pub fn resolve() -> Paths {
        Paths {
            bottles: bottles_root(),
            temp: temp_root(),
        }
    }

    /// Use explicit roots instead of the environment.
    pub fn with_roots(bottles: impl Into<PathBuf>, temp: impl Into<PathBuf>) -> Paths {
        Paths {
            bottles: bottles.into(),
            temp: temp.into(),
        }
    }

    /// Directory of a named bottle under the bottles root.
    pub fn bottle_dir(&self, name: &str) -> PathBuf {
        self.bottles.join(name)
    }
}

/// Bottles root: `CELLAR_BOTTLES_PATH` or `<data home>/cellar/bottles`.
pub fn bottles_root() -> PathBuf {
    if let Ok(path) = std::env::var("CELLAR_BOTTLES_PATH") {
        return PathBuf::from(path);
    }
    data_home().join("cellar/bottles")
}

/// Temp root: `CELLAR_TEMP_PATH` or `<data home>/cellar/temp`.
pub fn temp_root() -> PathBuf {
    if let Ok(path) = std::env::var("CELLAR_TEMP_PATH") {
        return PathBuf::from(path);
    }
    data_home().join("cellar/temp")
}

// XDG_DATA_HOME or ~/.local/share
fn data_home() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".local/share")
        })
}

/// True when the path is relative and never steps above its base.
///
/// Destination paths from manifests are joined under a bottle's
/// `drive_c`; anything absolute or containing `..` must be rejected
/// before the join.
pub fn is_safe_relative(path: &Path) -> bool {
    use std::path::Component;

    if path.is_absolute() {
        return false;
    }
    let mut depth: i32 = 0;
    for component in path.components() {
        match component {
            Component::ParentDir => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            Component::Normal(_) => depth += 1,
            Component::CurDir => {}
            Component::RootDir | Component::Prefix(_) => return false,
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bottle_dir_joins_name() {
        let paths = Paths::with_roots("/srv/bottles", "/srv/temp");
        assert_eq!(
            paths.bottle_dir("gaming"),
            PathBuf::from("/srv/bottles/gaming")
        );
    }

    #[test]
    fn test_safe_relative_accepts_plain_paths() {
        assert!(is_safe_relative(Path::new("windows/system32/d3dx9_43.dll")));
        assert!(is_safe_relative(Path::new("./ProgramData/fonts")));
    }

    #[test]
    fn test_safe_relative_rejects_escapes() {
        assert!(!is_safe_relative(Path::new("/etc/passwd")));
        assert!(!is_safe_relative(Path::new("../outside")));
        assert!(!is_safe_relative(Path::new("a/../../outside")));
    }
}
