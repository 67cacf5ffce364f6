//! Executor error types.

use crate::archive::ExtractError;
use crate::bottle::BottleError;
use crate::cab::CabError;
use crate::fetch::FetchError;
use crate::lock::LockError;
use crate::runner::RunnerError;
use thiserror::Error;

/// Errors that abort a whole install invocation.
///
/// Step-level problems never abort; they are carried in the report as
/// failed steps. Anything here means the bottle was not (or could not
/// safely be) mutated further.
#[derive(Error, Debug)]
pub enum InstallError {
    #[error("no manifest found for dependency '{dependency}'")]
    ManifestNotFound { dependency: String },

    #[error("install lock unavailable: {0}")]
    Locked(#[from] LockError),

    #[error("cannot create staging directory: {0}")]
    Staging(#[source] std::io::Error),

    #[error("cannot persist bottle config: {0}")]
    Config(#[from] BottleError),
}

/// Errors from one step. The step loop records them and moves on.
#[derive(Error, Debug)]
pub enum StepError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("extraction failed: {0}")]
    Extract(#[from] ExtractError),

    #[error("cabinet extraction failed: {0}")]
    Cab(#[from] CabError),

    #[error("{0}")]
    Runner(#[from] RunnerError),

    #[error("source '{0}' does not name a staged artifact")]
    SourceNotStaged(String),

    #[error("missing source file: {0}")]
    MissingSource(String),

    #[error("destination escapes the bottle: {0}")]
    UnsafeDestination(String),

    #[error("invalid glob pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        source: glob::PatternError,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
