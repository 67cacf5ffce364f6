//! Registry steps: DLL overrides, arbitrary keys and font entries.

use super::error::StepError;
use super::StepContext;
use crate::output;

/// Wine's per-prefix DLL override key.
const DLL_OVERRIDES_KEY: &str = r"HKEY_CURRENT_USER\Software\Wine\DllOverrides";

/// Windows font registration key.
const FONTS_KEY: &str = r"HKEY_LOCAL_MACHINE\Software\Microsoft\Windows NT\CurrentVersion\Fonts";

/// Register a DLL override. When `source` names a staged directory,
/// `dll` is treated as a glob under it and each match registers its own
/// override keyed by file stem; zero matches is a no-op. Otherwise
/// `dll` itself is the override name.
pub(super) fn override_dll(
    ctx: &StepContext<'_>,
    dll: &str,
    override_type: &str,
    source: Option<&str>,
) -> Result<(), StepError> {
    if let Some(staged) = source.and_then(|s| ctx.staging.resolve(s)) {
        let pattern = staged.join(dll).display().to_string();
        let matches = glob::glob(&pattern).map_err(|e| StepError::Pattern {
            pattern: pattern.clone(),
            source: e,
        })?;

        for path in matches.filter_map(Result::ok) {
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            ctx.runner
                .reg_add(ctx.bottle, DLL_OVERRIDES_KEY, stem, override_type, None)?;
            output::detail(&format!("override {} = {}", stem, override_type));
        }
        return Ok(());
    }

    ctx.runner
        .reg_add(ctx.bottle, DLL_OVERRIDES_KEY, dll, override_type, None)?;
    output::detail(&format!("override {} = {}", dll, override_type));
    Ok(())
}

/// Write one registry value as the manifest spells it.
pub(super) fn set_registry_key(
    ctx: &StepContext<'_>,
    key: &str,
    value: &str,
    data: &str,
    key_type: Option<&str>,
) -> Result<(), StepError> {
    ctx.runner.reg_add(ctx.bottle, key, value, data, key_type)?;
    output::detail(&format!("set {} \\ {}", key, value));
    Ok(())
}

/// Add a font registry entry pointing at an installed font file.
pub(super) fn register_font(
    ctx: &StepContext<'_>,
    file: &str,
    name: &str,
) -> Result<(), StepError> {
    ctx.runner.reg_add(ctx.bottle, FONTS_KEY, name, file, None)?;
    output::detail(&format!("registered font {}", name));
    Ok(())
}
