//! Extraction steps: cabinets and general archives.

use super::error::StepError;
use super::StepContext;
use crate::archive;
use crate::cab;
use crate::fetch::{is_remote_url, FetchRequest};
use crate::output;
use std::path::Path;

fn stem_of(file_name: &str) -> &str {
    Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(file_name)
}

/// Unpack a cabinet into the staging area.
///
/// Remote cabinets are downloaded first, then unpacked twice: into a
/// directory named after the staged file and into one named after its
/// stem. Manifests reference whichever layout they were written
/// against. A failed first unpack still attempts the second; the step
/// fails if either did.
///
/// A `temp/` source instead names a staged directory holding the
/// cabinet (produced by an earlier step); that cabinet is unpacked once
/// into a stem-named directory, and failure ends the step immediately.
pub(super) fn cab_extract(
    ctx: &StepContext<'_>,
    url: &str,
    file_name: &str,
    rename: Option<&str>,
    checksum: Option<&str>,
) -> Result<(), StepError> {
    if is_remote_url(url) {
        let request = FetchRequest {
            url,
            file_name,
            rename,
            checksum,
        };
        let cabinet = ctx.fetcher.fetch(&request, ctx.staging.downloads())?;
        let staged_name = request.staged_name();

        let mut failure = None;
        if let Err(e) = cab::cabextract(&cabinet, &ctx.staging.join(staged_name)) {
            output::error(&format!("{}", e));
            failure = Some(e);
        }
        let stem = stem_of(staged_name);
        if stem != staged_name
            && let Err(e) = cab::cabextract(&cabinet, &ctx.staging.join(stem))
        {
            output::error(&format!("{}", e));
            failure = Some(e);
        }

        return match failure {
            Some(e) => Err(e.into()),
            None => Ok(()),
        };
    }

    let staged_dir = ctx
        .staging
        .resolve(url)
        .ok_or_else(|| StepError::SourceNotStaged(url.to_string()))?;
    let dest = stem_of(rename.unwrap_or(file_name));
    cab::cabextract(&staged_dir.join(file_name), &ctx.staging.join(dest))?;
    Ok(())
}

/// Download an archive and unpack it into a staging directory named
/// after its stem. Any directory left under that name by an earlier
/// invocation is replaced wholesale.
pub(super) fn archive_extract(
    ctx: &StepContext<'_>,
    url: &str,
    file_name: &str,
    rename: Option<&str>,
    checksum: Option<&str>,
) -> Result<(), StepError> {
    let request = FetchRequest {
        url,
        file_name,
        rename,
        checksum,
    };
    let archive_path = ctx.fetcher.fetch(&request, ctx.staging.downloads())?;

    let dest = ctx.staging.join(stem_of(request.staged_name()));
    if dest.exists() {
        std::fs::remove_dir_all(&dest)?;
    }
    archive::extract(&archive_path, &dest)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stem_of() {
        assert_eq!(stem_of("directx_Jun2010_redist.exe"), "directx_Jun2010_redist");
        assert_eq!(stem_of("noext"), "noext");
        assert_eq!(stem_of("pack.tar.gz"), "pack.tar");
    }
}
