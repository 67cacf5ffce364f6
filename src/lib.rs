//! Manifest-driven dependency installer for Wine bottles.
//!
//! A bottle is an isolated Wine prefix with its own `drive_c` and
//! configuration. Dependencies (runtimes, fonts, DLL packs) are
//! described by YAML manifests in a remote repository: an ordered list
//! of typed steps plus uninstaller metadata. This crate resolves a
//! manifest, executes its steps in order against a bottle, and records
//! the outcome in the bottle's install ledger.
//!
//! # Example Manifest
//!
//! ```yaml
//! Description: Microsoft DirectX 9 runtime
//! Category: runtimes
//! Steps:
//!   - action: cab_extract
//!     url: "https://example.com/directx_Jun2010_redist.exe"
//!     file_name: "directx_Jun2010_redist.exe"
//!   - action: copy_dll
//!     url: "temp/directx_Jun2010_redist"
//!     file_name: "*.dll"
//!     dest: "windows/system32"
//!   - action: override_dll
//!     dll: "d3dx9_43"
//!     type: "native"
//! ```
//!
//! # Guarantees
//!
//! - Steps run strictly in manifest order; a failed step is recorded in
//!   the [`executor::InstallReport`] and execution continues.
//! - Only an unresolvable manifest aborts an install, and it does so
//!   before the bottle is touched.
//! - Extraction-family steps mark the dependency as not cleanly
//!   removable; the ledger then carries the [`bottle::NO_UNINSTALLER`]
//!   sentinel instead of an uninstaller name.
//! - Ledger updates are idempotent and persisted atomically.
//!
//! External effects are behind traits ([`fetch::Fetcher`],
//! [`runner::Runner`], [`snapshot::Snapshotter`],
//! [`repo::ManifestSource`]), so the step loop is testable without a
//! network or a Wine installation.

pub mod archive;
pub mod bottle;
pub mod cab;
pub mod executor;
pub mod fetch;
pub mod hash;
pub mod lock;
pub mod manifest;
pub mod observer;
pub mod output;
pub mod paths;
pub mod repo;
pub mod runner;
pub mod snapshot;
pub mod staging;

pub use bottle::{BottleConfig, NO_UNINSTALLER};
pub use executor::{DependencyInstaller, InstallError, InstallReport, RemovalPath, StepStatus};
pub use manifest::{DependencyManifest, DependencyRef, Step};
pub use observer::{InstallObserver, NullObserver};
pub use repo::{DependencyRepo, ManifestSource};
