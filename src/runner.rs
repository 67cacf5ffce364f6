//! Process execution inside bottles.
//!
//! [`Runner`] is the boundary to the Wine process layer: running
//! installers, builtin commands, uninstaller sessions and registry
//! writes. The step executor only talks to this trait, so tests record
//! calls instead of spawning anything. [`WineRunner`] shells out to the
//! `wine` binary with `WINEPREFIX` pointing at the bottle.

use crate::bottle::BottleConfig;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RunnerError {
    #[error("failed to spawn '{command}': {source}")]
    Spawn {
        command: String,
        source: std::io::Error,
    },
    #[error("command failed: {command} (exit code: {code:?})\nstderr: {stderr}")]
    Failed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },
}

pub trait Runner {
    /// Run an installer executable inside the bottle. Extra environment
    /// variables come from the manifest step.
    fn run_executable(
        &self,
        bottle: &BottleConfig,
        executable: &Path,
        arguments: Option<&str>,
        environment: &BTreeMap<String, String>,
    ) -> Result<(), RunnerError>;

    /// Run a Wine builtin command (e.g. `uninstaller --list`) and return
    /// its stdout.
    fn run_command(&self, bottle: &BottleConfig, command: &str) -> Result<String, RunnerError>;

    /// Remove a program by its uninstaller registry id.
    fn run_uninstaller(&self, bottle: &BottleConfig, id: &str) -> Result<(), RunnerError>;

    /// Write one registry value.
    fn reg_add(
        &self,
        bottle: &BottleConfig,
        key: &str,
        value: &str,
        data: &str,
        key_type: Option<&str>,
    ) -> Result<(), RunnerError>;
}

/// Production runner shelling out to Wine.
#[derive(Debug, Clone)]
pub struct WineRunner {
    wine: PathBuf,
}

impl WineRunner {
    /// Use the binary named by `CELLAR_WINE`, or `wine` from PATH.
    pub fn from_env() -> WineRunner {
        let wine = std::env::var("CELLAR_WINE").unwrap_or_else(|_| "wine".to_string());
        WineRunner { wine: wine.into() }
    }

    pub fn with_binary(wine: impl Into<PathBuf>) -> WineRunner {
        WineRunner { wine: wine.into() }
    }

    fn command(&self, bottle: &BottleConfig) -> Command {
        let mut cmd = Command::new(&self.wine);
        cmd.env("WINEPREFIX", &bottle.path);
        cmd.env("WINEDEBUG", "-all");
        cmd
    }

    fn describe(args: &[&str]) -> String {
        format!("wine {}", args.join(" "))
    }

    fn run_checked(&self, bottle: &BottleConfig, args: &[&str]) -> Result<String, RunnerError> {
        let output = self
            .command(bottle)
            .args(args)
            .output()
            .map_err(|e| RunnerError::Spawn {
                command: Self::describe(args),
                source: e,
            })?;

        if !output.status.success() {
            return Err(RunnerError::Failed {
                command: Self::describe(args),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

impl Runner for WineRunner {
    fn run_executable(
        &self,
        bottle: &BottleConfig,
        executable: &Path,
        arguments: Option<&str>,
        environment: &BTreeMap<String, String>,
    ) -> Result<(), RunnerError> {
        let is_msi = executable
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("msi"));

        let mut cmd = self.command(bottle);
        if is_msi {
            cmd.arg("msiexec").arg("/i");
        }
        cmd.arg(executable);
        if let Some(arguments) = arguments {
            cmd.args(arguments.split_whitespace());
        }
        cmd.envs(environment);

        // Installer exit codes are unreliable; a spawn that ran to
        // completion counts as done.
        cmd.status()
            .map_err(|e| RunnerError::Spawn {
                command: format!("wine {}", executable.display()),
                source: e,
            })
            .map(|_| ())
    }

    fn run_command(&self, bottle: &BottleConfig, command: &str) -> Result<String, RunnerError> {
        let args: Vec<&str> = command.split_whitespace().collect();
        self.run_checked(bottle, &args)
    }

    fn run_uninstaller(&self, bottle: &BottleConfig, id: &str) -> Result<(), RunnerError> {
        self.run_checked(bottle, &["uninstaller", "--remove", id])
            .map(|_| ())
    }

    fn reg_add(
        &self,
        bottle: &BottleConfig,
        key: &str,
        value: &str,
        data: &str,
        key_type: Option<&str>,
    ) -> Result<(), RunnerError> {
        let mut args = vec!["reg", "add", key, "/v", value, "/d", data];
        if let Some(key_type) = key_type {
            args.push("/t");
            args.push(key_type);
        }
        args.push("/f");
        self.run_checked(bottle, &args).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    // A fake wine binary is more than these tests need; spawning a
    // missing binary exercises the error shape.
    #[test]
    fn test_missing_binary_reports_spawn_error() {
        let dir = TempDir::new().unwrap();
        let bottle = BottleConfig::new("t", dir.path());
        let runner = WineRunner::with_binary("/nonexistent/wine-binary");

        let err = runner.run_command(&bottle, "uninstaller --list").unwrap_err();
        assert!(matches!(err, RunnerError::Spawn { .. }));
        assert!(err.to_string().contains("uninstaller --list"));
    }

    #[test]
    fn test_from_env_defaults_to_wine() {
        // Only checks the default; CELLAR_WINE is left untouched to keep
        // tests independent.
        if std::env::var("CELLAR_WINE").is_err() {
            let runner = WineRunner::from_env();
            assert_eq!(runner.wine, PathBuf::from("wine"));
        }
    }
}
