//! Dependency install executor - runs manifest steps against a bottle.
//!
//! Steps execute strictly in manifest order. A failed step is recorded
//! and the loop moves on; one bad download must not strand a manifest
//! that still has registry keys or overrides to apply. Only a missing
//! manifest aborts, before the bottle is touched. The ledger is settled
//! once, after the loop, and persisted atomically.

mod error;
mod extract;
mod files;
mod process;
mod registry;
mod report;

pub use error::{InstallError, StepError};
pub use report::{InstallReport, RemovalPath, StepReport, StepStatus};

use crate::bottle::BottleConfig;
use crate::fetch::Fetcher;
use crate::lock;
use crate::manifest::{DependencyRef, Step};
use crate::observer::InstallObserver;
use crate::output;
use crate::paths::Paths;
use crate::repo::ManifestSource;
use crate::runner::Runner;
use crate::snapshot::Snapshotter;
use crate::staging::Staging;

/// Collaborators step handlers need.
pub(crate) struct StepContext<'a> {
    pub bottle: &'a BottleConfig,
    pub staging: &'a Staging,
    pub fetcher: &'a dyn Fetcher,
    pub runner: &'a dyn Runner,
}

/// Installs dependencies into bottles.
///
/// All external effects go through injected collaborators: manifest
/// resolution, downloads, process execution and snapshots. The
/// installer itself owns only the step loop, the staging area and the
/// ledger bookkeeping.
pub struct DependencyInstaller<'a> {
    source: &'a dyn ManifestSource,
    fetcher: &'a dyn Fetcher,
    runner: &'a dyn Runner,
    snapshotter: Option<&'a dyn Snapshotter>,
    paths: Paths,
}

impl<'a> DependencyInstaller<'a> {
    pub fn new(
        source: &'a dyn ManifestSource,
        fetcher: &'a dyn Fetcher,
        runner: &'a dyn Runner,
        paths: Paths,
    ) -> DependencyInstaller<'a> {
        DependencyInstaller {
            source,
            fetcher,
            runner,
            snapshotter: None,
            paths,
        }
    }

    /// Attach a snapshot backend, used for bottles with versioning
    /// enabled.
    pub fn with_snapshotter(mut self, snapshotter: &'a dyn Snapshotter) -> DependencyInstaller<'a> {
        self.snapshotter = Some(snapshotter);
        self
    }

    /// Install one dependency into a bottle.
    ///
    /// Returns the structured report on completion; `Err` means the
    /// install could not run at all (unknown dependency, lock held or
    /// ledger persistence failure).
    pub fn install(
        &self,
        bottle: &mut BottleConfig,
        dependency: &DependencyRef,
        observer: &dyn InstallObserver,
    ) -> Result<InstallReport, InstallError> {
        let _lock = lock::acquire_bottle_lock(bottle)?;

        output::action(&format!(
            "Installing {} into bottle '{}'",
            dependency.name, bottle.name
        ));

        if bottle.versioning {
            self.take_snapshot(bottle, dependency);
        }

        observer.started(&dependency.name);

        let Some(manifest) = self.source.manifest(dependency) else {
            observer.finished(&dependency.name);
            observer.installed(&dependency.name, false);
            return Err(InstallError::ManifestNotFound {
                dependency: dependency.name.clone(),
            });
        };

        let mut removal = RemovalPath::declared(&manifest);
        let total = manifest.steps.len();
        let mut steps = Vec::with_capacity(total);

        {
            let staging = Staging::create(&self.paths.temp, &dependency.name)
                .map_err(InstallError::Staging)?;
            let ctx = StepContext {
                bottle,
                staging: &staging,
                fetcher: self.fetcher,
                runner: self.runner,
            };

            for (index, step) in manifest.steps.iter().enumerate() {
                // The removal path is folded in before the step runs, so
                // an extraction that fails halfway still rules out a
                // clean uninstall.
                removal = removal.combine(RemovalPath::for_step(step));

                output::sub_action(&format!("{} ({}/{})", step.kind(), index + 1, total));
                let status = self.apply_step(&ctx, step, &dependency.name, observer);
                match &status {
                    StepStatus::Applied => {}
                    StepStatus::Failed { reason } => {
                        output::error(&format!("step {} failed: {}", step.kind(), reason));
                    }
                    StepStatus::Skipped { reason } => {
                        output::skip(&format!("step {} skipped: {}", step.kind(), reason));
                    }
                }
                steps.push(StepReport {
                    index,
                    action: step.kind().to_string(),
                    status,
                });
            }
        }

        if !bottle.record_installed(&dependency.name) {
            output::detail(&format!(
                "{} already recorded in '{}'",
                dependency.name, bottle.name
            ));
        }
        if let Some(entry) = removal.ledger_entry() {
            bottle.record_uninstaller(&dependency.name, entry);
        }
        bottle.save()?;

        observer.finished(&dependency.name);
        let removable = removal.removable();
        observer.installed(&dependency.name, removable);

        let report = InstallReport {
            dependency: dependency.name.clone(),
            steps,
            removal,
            removable,
        };

        if report.all_applied() {
            output::success(&format!(
                "{} installed in '{}'",
                dependency.name, bottle.name
            ));
        } else {
            output::warning(&format!(
                "{} finished with {} failed step(s) in '{}'",
                dependency.name,
                report.failed_steps().count(),
                bottle.name
            ));
        }

        Ok(report)
    }

    fn apply_step(
        &self,
        ctx: &StepContext<'_>,
        step: &Step,
        dependency: &str,
        observer: &dyn InstallObserver,
    ) -> StepStatus {
        let result = match step {
            Step::DeleteSys32Dlls { dlls } => files::delete_sys32_dlls(ctx, dlls),
            Step::InstallExe {
                url,
                file_name,
                rename,
                file_checksum,
                arguments,
                environment,
            } => process::install_executable(
                ctx,
                url,
                file_name,
                rename.as_deref(),
                file_checksum.as_deref(),
                arguments.as_deref(),
                environment,
            ),
            Step::Uninstall { file_name } => process::uninstall_by_name(ctx, file_name),
            Step::CabExtract {
                url,
                file_name,
                rename,
                file_checksum,
            } => extract::cab_extract(
                ctx,
                url,
                file_name,
                rename.as_deref(),
                file_checksum.as_deref(),
            ),
            Step::ArchiveExtract {
                url,
                file_name,
                rename,
                file_checksum,
            } => extract::archive_extract(
                ctx,
                url,
                file_name,
                rename.as_deref(),
                file_checksum.as_deref(),
            ),
            Step::InstallFonts { url, fonts } => files::install_fonts(ctx, url, fonts),
            Step::CopyDll {
                url,
                file_name,
                dest,
            } => files::copy_dll(ctx, url, file_name, dest),
            Step::OverrideDll {
                dll,
                override_type,
                url,
            } => registry::override_dll(ctx, dll, override_type, url.as_deref()),
            Step::SetRegistryKey {
                key,
                value,
                data,
                key_type,
            } => registry::set_registry_key(ctx, key, value, data, key_type.as_deref()),
            Step::RegisterFont { file, name } => registry::register_font(ctx, file, name),
            Step::Unknown => {
                return StepStatus::Skipped {
                    reason: "unrecognized action".to_string(),
                };
            }
        };

        match result {
            Ok(()) => StepStatus::Applied,
            Err(e) => {
                if matches!(e, StepError::Fetch(_)) {
                    observer.fetch_failed(dependency);
                }
                let reason = e.to_string();
                observer.step_error(dependency, &reason);
                StepStatus::Failed { reason }
            }
        }
    }

    // Snapshot problems are reported but never block the install.
    fn take_snapshot(&self, bottle: &BottleConfig, dependency: &DependencyRef) {
        let Some(snapshotter) = self.snapshotter else {
            output::detail("versioning enabled but no snapshot backend configured");
            return;
        };
        let label = format!("before {}", dependency.name);
        match snapshotter.snapshot(bottle, &label) {
            Ok(()) => output::detail(&format!("snapshot taken: {}", label)),
            Err(e) => output::warning(&format!("snapshot failed for '{}': {}", bottle.name, e)),
        }
    }
}
