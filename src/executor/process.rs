//! Process steps: installer execution and uninstaller sessions.

use super::error::StepError;
use super::StepContext;
use crate::fetch::FetchRequest;
use crate::output;
use std::collections::BTreeMap;

/// Download an installer and run it inside the bottle.
pub(super) fn install_executable(
    ctx: &StepContext<'_>,
    url: &str,
    file_name: &str,
    rename: Option<&str>,
    checksum: Option<&str>,
    arguments: Option<&str>,
    environment: &BTreeMap<String, String>,
) -> Result<(), StepError> {
    let request = FetchRequest {
        url,
        file_name,
        rename,
        checksum,
    };
    let installer = ctx.fetcher.fetch(&request, ctx.staging.downloads())?;

    output::detail(&format!("running {}", request.staged_name()));
    ctx.runner
        .run_executable(ctx.bottle, &installer, arguments, environment)?;
    Ok(())
}

/// Remove a program whose uninstaller entry matches `file_name`. No
/// matching entry is a quiet no-op; the program may simply be absent.
pub(super) fn uninstall_by_name(ctx: &StepContext<'_>, file_name: &str) -> Result<(), StepError> {
    let listing = ctx.runner.run_command(ctx.bottle, "uninstaller --list")?;

    match match_uninstaller_id(&listing, file_name) {
        Some(id) => {
            output::detail(&format!("uninstalling {} ({})", file_name, id));
            ctx.runner.run_uninstaller(ctx.bottle, id)?;
        }
        None => {
            output::detail(&format!("no uninstaller entry matches {}", file_name));
        }
    }
    Ok(())
}

/// Find the uninstaller id for the first listing line mentioning
/// `file_name`. Lines look like `{id}|||Display Name`.
fn match_uninstaller_id<'a>(listing: &'a str, file_name: &str) -> Option<&'a str> {
    listing
        .lines()
        .find(|line| line.contains(file_name))
        .and_then(|line| line.split('|').next())
        .map(str::trim)
        .filter(|id| !id.is_empty())
}
