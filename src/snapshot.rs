//! Bottle state snapshots.
//!
//! When a bottle has versioning enabled, the installer asks for a
//! snapshot before mutating anything. The actual snapshot mechanism
//! lives outside this crate; implementations plug in through
//! [`Snapshotter`]. A failed snapshot is reported but never blocks the
//! install.

use crate::bottle::BottleConfig;
use thiserror::Error;

#[derive(Error, Debug)]
#[error("snapshot failed: {0}")]
pub struct SnapshotError(pub String);

pub trait Snapshotter {
    /// Capture the bottle's current state under a human-readable label.
    fn snapshot(&self, bottle: &BottleConfig, label: &str) -> Result<(), SnapshotError>;
}
