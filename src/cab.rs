//! Windows cabinet extraction.
//!
//! Cabinets are unpacked with the external `cabextract` tool. Extraction
//! always targets a directory inside the install's staging area; callers
//! choose the directory name.

use crate::output;
use std::path::Path;
use std::process::Command;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CabError {
    #[error("failed to run cabextract (is it installed?): {0}")]
    Spawn(std::io::Error),
    #[error("cabextract failed for '{archive}' (exit code: {code:?}): {stderr}")]
    Tool {
        archive: String,
        code: Option<i32>,
        stderr: String,
    },
    #[error("cannot create directory '{path}': {source}")]
    Dest {
        path: String,
        source: std::io::Error,
    },
}

/// Unpack `archive` into `dest` with cabextract, creating `dest` first.
pub fn cabextract(archive: &Path, dest: &Path) -> Result<(), CabError> {
    std::fs::create_dir_all(dest).map_err(|e| CabError::Dest {
        path: dest.display().to_string(),
        source: e,
    })?;

    let pb = output::spinner(&format!(
        "unpacking {}",
        archive
            .file_name()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| archive.display().to_string())
    ));

    let result = Command::new("cabextract")
        .arg("-d")
        .arg(dest)
        .arg(archive)
        .output();
    output::progress_done(pb);

    let command_output = result.map_err(CabError::Spawn)?;
    if !command_output.status.success() {
        return Err(CabError::Tool {
            archive: archive.display().to_string(),
            code: command_output.status.code(),
            stderr: String::from_utf8_lossy(&command_output.stderr)
                .trim()
                .to_string(),
        });
    }

    output::detail(&format!("unpacked cabinet to {}", dest.display()));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    // Exercises the failure path without depending on a real cabinet;
    // cabextract exits non-zero for files that are not cabinets. Skipped
    // when the tool is not on PATH.
    #[test]
    fn test_invalid_cabinet_reports_tool_error() {
        if Command::new("cabextract").arg("--version").output().is_err() {
            return;
        }

        let dir = TempDir::new().unwrap();
        let fake = dir.path().join("not-a-cab.exe");
        std::fs::write(&fake, b"plain text").unwrap();

        let err = cabextract(&fake, &dir.path().join("out")).unwrap_err();
        assert!(matches!(err, CabError::Tool { .. }));
    }

    #[test]
    fn test_dest_is_created() {
        let dir = TempDir::new().unwrap();
        let dest = dir.path().join("nested/cabinet-out");
        // Even when the tool is missing, the destination gets created
        // before the spawn attempt.
        let _ = cabextract(Path::new("/nonexistent.cab"), &dest);
        assert!(dest.exists());
    }
}
