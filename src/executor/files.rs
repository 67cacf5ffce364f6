//! File placement steps: DLL removal, font installs and DLL copies.

use super::error::StepError;
use super::StepContext;
use crate::output;
use crate::paths::is_safe_relative;
use std::path::Path;

/// Remove the named DLLs from the bottle's system32 directory. DLLs
/// that are already absent are logged and skipped.
pub(super) fn delete_sys32_dlls(ctx: &StepContext<'_>, dlls: &[String]) -> Result<(), StepError> {
    let system32 = ctx.bottle.system32();
    for dll in dlls {
        match std::fs::remove_file(system32.join(dll)) {
            Ok(()) => output::detail(&format!("removed {} from system32", dll)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                output::warning(&format!(
                    "{} not found in system32 of bottle '{}'",
                    dll, ctx.bottle.name
                ));
            }
            Err(e) => return Err(StepError::Io(e)),
        }
    }
    Ok(())
}

/// Copy font files from a staged directory into the bottle's Fonts
/// directory. A missing staged font is a step failure; it means an
/// earlier extraction did not produce what this step expects.
pub(super) fn install_fonts(
    ctx: &StepContext<'_>,
    source: &str,
    fonts: &[String],
) -> Result<(), StepError> {
    let staged = ctx
        .staging
        .resolve(source)
        .ok_or_else(|| StepError::SourceNotStaged(source.to_string()))?;

    let fonts_dir = ctx.bottle.fonts_dir();
    std::fs::create_dir_all(&fonts_dir)?;

    for font in fonts {
        std::fs::copy(staged.join(font), fonts_dir.join(font))?;
        output::detail(&format!("installed font {}", font));
    }
    Ok(())
}

/// Copy one file, or every glob match, from a staged directory into the
/// bottle's drive_c.
///
/// With a glob, `dest` names a directory and each match keeps its file
/// name. Without one, `dest` is the full destination path relative to
/// drive_c.
pub(super) fn copy_dll(
    ctx: &StepContext<'_>,
    source: &str,
    file_name: &str,
    dest: &str,
) -> Result<(), StepError> {
    let staged = ctx
        .staging
        .resolve(source)
        .ok_or_else(|| StepError::SourceNotStaged(source.to_string()))?;

    if !is_safe_relative(Path::new(dest)) {
        return Err(StepError::UnsafeDestination(dest.to_string()));
    }
    let drive_c = ctx.bottle.drive_c();

    if file_name.contains('*') {
        let pattern = staged.join(file_name).display().to_string();
        let matches = glob::glob(&pattern).map_err(|e| StepError::Pattern {
            pattern: pattern.clone(),
            source: e,
        })?;

        let dest_dir = drive_c.join(dest);
        std::fs::create_dir_all(&dest_dir)?;

        let mut copied = 0usize;
        for path in matches.filter_map(Result::ok) {
            let Some(name) = path.file_name() else {
                continue;
            };
            std::fs::copy(&path, dest_dir.join(name))?;
            copied += 1;
        }
        output::detail(&format!(
            "copied {} file(s) matching {} to {}",
            copied, file_name, dest
        ));
        return Ok(());
    }

    let source_path = staged.join(file_name);
    if !source_path.exists() {
        // Usually a knock-on from a failed extraction earlier in the
        // manifest.
        return Err(StepError::MissingSource(source_path.display().to_string()));
    }

    let dest_path = drive_c.join(dest);
    if let Some(parent) = dest_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::copy(&source_path, &dest_path)?;
    output::detail(&format!("copied {} to {}", file_name, dest));
    Ok(())
}
