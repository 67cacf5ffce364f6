//! Structured record of one install invocation.
//!
//! Every step contributes an entry regardless of outcome, so callers
//! can tell "everything applied" from "finished with failed steps"
//! without scraping logs.

use crate::bottle::NO_UNINSTALLER;
use crate::manifest::{DependencyManifest, Step};
use serde::Serialize;

/// Outcome of one install invocation.
#[derive(Debug, Clone, Serialize)]
pub struct InstallReport {
    pub dependency: String,
    /// One entry per manifest step, in execution order.
    pub steps: Vec<StepReport>,
    pub removal: RemovalPath,
    /// False when the dependency left no uninstaller behind; frontends
    /// should not offer a clean uninstall then.
    pub removable: bool,
}

impl InstallReport {
    /// True when no step failed. Skipped steps do not count against it.
    pub fn all_applied(&self) -> bool {
        self.steps
            .iter()
            .all(|s| !matches!(s.status, StepStatus::Failed { .. }))
    }

    pub fn failed_steps(&self) -> impl Iterator<Item = &StepReport> {
        self.steps
            .iter()
            .filter(|s| matches!(s.status, StepStatus::Failed { .. }))
    }
}

/// What happened to a single step.
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    /// Zero-based position in the manifest.
    pub index: usize,
    /// Wire name of the action.
    pub action: String,
    pub status: StepStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum StepStatus {
    Applied,
    Failed { reason: String },
    Skipped { reason: String },
}

/// How the installed dependency can later be removed.
///
/// Starts as [`RemovalPath::Undetermined`] and is folded over the
/// manifest: extraction-family steps force [`RemovalPath::NoUninstaller`]
/// (files copied into the bottle have no uninstall entry), otherwise a
/// declared uninstaller name wins over nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "reference", rename_all = "snake_case")]
pub enum RemovalPath {
    Undetermined,
    Uninstaller(String),
    NoUninstaller,
}

impl RemovalPath {
    /// Contribution of one step, independent of whether it succeeds.
    pub fn for_step(step: &Step) -> RemovalPath {
        if step.leaves_no_uninstaller() {
            RemovalPath::NoUninstaller
        } else {
            RemovalPath::Undetermined
        }
    }

    /// Contribution of the manifest's declared uninstaller.
    pub fn declared(manifest: &DependencyManifest) -> RemovalPath {
        match &manifest.uninstaller {
            Some(name) => RemovalPath::Uninstaller(name.clone()),
            None => RemovalPath::Undetermined,
        }
    }

    /// Fold two contributions. `NoUninstaller` beats everything, a known
    /// uninstaller beats undetermined.
    #[must_use]
    pub fn combine(self, other: RemovalPath) -> RemovalPath {
        match (self, other) {
            (RemovalPath::NoUninstaller, _) | (_, RemovalPath::NoUninstaller) => {
                RemovalPath::NoUninstaller
            }
            (RemovalPath::Uninstaller(name), _) | (RemovalPath::Undetermined, RemovalPath::Uninstaller(name)) => {
                RemovalPath::Uninstaller(name)
            }
            (RemovalPath::Undetermined, RemovalPath::Undetermined) => RemovalPath::Undetermined,
        }
    }

    /// Ledger value for the bottle config. Undetermined writes nothing.
    pub fn ledger_entry(&self) -> Option<&str> {
        match self {
            RemovalPath::Undetermined => None,
            RemovalPath::Uninstaller(name) => Some(name),
            RemovalPath::NoUninstaller => Some(NO_UNINSTALLER),
        }
    }

    /// Whether a clean uninstall remains possible.
    pub fn removable(&self) -> bool {
        !matches!(self, RemovalPath::NoUninstaller)
    }
}
