//! Fetching dependency artifacts into the staging area.
//!
//! The [`Fetcher`] trait is the download boundary of the step executor;
//! tests substitute an in-memory implementation. [`HttpFetcher`] is the
//! production implementation: streaming downloads with a progress bar
//! and SHA256 verification when the manifest carries a checksum.

use crate::hash;
use crate::output;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;
use thiserror::Error;

/// Default HTTP timeout in seconds
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// HTTP timeout from `CELLAR_HTTP_TIMEOUT` or the default, clamped to a
/// reasonable range. Read once per process.
pub fn http_timeout() -> Duration {
    static TIMEOUT: OnceLock<Duration> = OnceLock::new();
    *TIMEOUT.get_or_init(|| {
        let secs = std::env::var("CELLAR_HTTP_TIMEOUT")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS);
        Duration::from_secs(secs.clamp(5, 300))
    })
}

/// True for sources the engine downloads, as opposed to `temp/` staged
/// paths.
pub fn is_remote_url(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("download failed for '{url}': {reason}")]
    Http { url: String, reason: String },
    #[error("cannot write '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("checksum verification failed: {0}")]
    Checksum(#[from] hash::HashError),
}

/// What to fetch and under which name to stage it.
#[derive(Debug, Clone)]
pub struct FetchRequest<'a> {
    pub url: &'a str,
    pub file_name: &'a str,
    /// Staged name override; repository manifests use this when several
    /// dependencies share one upstream file name.
    pub rename: Option<&'a str>,
    /// Expected SHA256 of the artifact, when the manifest declares one.
    pub checksum: Option<&'a str>,
}

impl FetchRequest<'_> {
    /// Name the artifact is staged under.
    pub fn staged_name(&self) -> &str {
        self.rename.unwrap_or(self.file_name)
    }
}

/// Downloads one artifact into a staging directory and returns the
/// staged path.
pub trait Fetcher {
    fn fetch(&self, request: &FetchRequest<'_>, staging_dir: &Path) -> Result<PathBuf, FetchError>;
}

/// Streaming HTTP downloader.
#[derive(Debug, Default)]
pub struct HttpFetcher;

impl HttpFetcher {
    pub fn new() -> HttpFetcher {
        HttpFetcher
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, request: &FetchRequest<'_>, staging_dir: &Path) -> Result<PathBuf, FetchError> {
        let dest = staging_dir.join(request.staged_name());
        let total = download(request.url, &dest)?;
        output::detail(&format!(
            "downloaded {} ({} bytes)",
            request.staged_name(),
            total
        ));

        if let Some(expected) = request.checksum {
            hash::verify_sha256(&dest, expected)?;
        }

        Ok(dest)
    }
}

fn download(url: &str, dest: &Path) -> Result<u64, FetchError> {
    let file_name = dest
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "download".to_string());
    let pb = output::spinner(&format!("downloading {}", file_name));

    let response = ureq::get(url)
        .timeout(http_timeout())
        .call()
        .map_err(|e| {
            pb.finish_and_clear();
            FetchError::Http {
                url: url.to_string(),
                reason: e.to_string(),
            }
        })?;

    if let Some(len) = response
        .header("content-length")
        .and_then(|s| s.parse().ok())
    {
        output::upgrade_to_bytes(&pb, len);
    }

    let io_err = |e: std::io::Error| FetchError::Io {
        path: dest.display().to_string(),
        source: e,
    };

    let mut file = std::fs::File::create(dest).map_err(io_err)?;
    let mut reader = response.into_reader();
    let mut buffer = [0u8; 8192];
    let mut total_bytes = 0u64;

    loop {
        let bytes_read = reader.read(&mut buffer).map_err(io_err)?;
        if bytes_read == 0 {
            break;
        }
        file.write_all(&buffer[..bytes_read]).map_err(io_err)?;
        total_bytes += bytes_read as u64;
        pb.set_position(total_bytes);
    }

    output::progress_done(pb);
    Ok(total_bytes)
}
