//! Install progress observation.
//!
//! Frontends watch an install through [`InstallObserver`]. All callbacks
//! have empty defaults so an observer implements only what it renders.
//! Callbacks may fire from a worker thread; implementations relay to
//! their own main loop when needed.

/// Receives progress notifications during one dependency install.
pub trait InstallObserver {
    /// The install entered its network/work phase.
    fn started(&self, _dependency: &str) {}

    /// The install finished its work phase; fires on failure paths too,
    /// so frontends can always release spinners.
    fn finished(&self, _dependency: &str) {}

    /// A download could not be completed.
    fn fetch_failed(&self, _dependency: &str) {}

    /// A step reported an error; the install continues with later steps.
    fn step_error(&self, _dependency: &str, _detail: &str) {}

    /// Final outcome. `removable` is false when the dependency left no
    /// uninstaller behind, so frontends should not offer a clean
    /// uninstall.
    fn installed(&self, _dependency: &str, _removable: bool) {}
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl InstallObserver for NullObserver {}
