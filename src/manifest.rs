//! Dependency manifests - the typed form of a repository YAML document.
//!
//! A manifest describes how to install one dependency into a bottle: an
//! ordered list of steps plus metadata. Step order is part of the
//! contract; later steps routinely consume files staged by earlier ones,
//! so steps are always executed in declaration order.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("invalid manifest YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Identifies a dependency within the repository.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DependencyRef {
    pub name: String,
    pub category: String,
}

impl DependencyRef {
    pub fn new(name: impl Into<String>, category: impl Into<String>) -> DependencyRef {
        DependencyRef {
            name: name.into(),
            category: category.into(),
        }
    }
}

impl std::fmt::Display for DependencyRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.category, self.name)
    }
}

/// A parsed dependency manifest.
///
/// Top-level keys follow the repository's PascalCase convention. Unknown
/// keys are ignored so manifests can grow without breaking older engines.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DependencyManifest {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    /// Display name of the uninstaller entry the dependency registers,
    /// when its installer provides one.
    #[serde(default)]
    pub uninstaller: Option<String>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl DependencyManifest {
    pub fn from_yaml(text: &str) -> Result<DependencyManifest, ManifestError> {
        Ok(serde_yaml::from_str(text)?)
    }
}

/// One typed install action.
///
/// The `action` key of each YAML step selects the variant. Actions this
/// engine does not recognize deserialize as [`Step::Unknown`] and are
/// skipped at execution time, so old engines tolerate new repository
/// manifests.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// Remove named DLLs from the bottle's system32 directory.
    DeleteSys32Dlls { dlls: Vec<String> },

    /// Download an installer and run it inside the bottle. `.msi` files
    /// are routed through msiexec.
    #[serde(alias = "install_msi")]
    InstallExe {
        url: String,
        file_name: String,
        #[serde(default)]
        rename: Option<String>,
        #[serde(default)]
        file_checksum: Option<String>,
        #[serde(default)]
        arguments: Option<String>,
        #[serde(default)]
        environment: BTreeMap<String, String>,
    },

    /// Remove a previously installed program through the bottle's
    /// uninstaller registry, matching entries by file name.
    Uninstall { file_name: String },

    /// Fetch a cabinet archive (or reuse a staged one) and unpack it
    /// with cabextract into the staging area.
    CabExtract {
        url: String,
        file_name: String,
        #[serde(default)]
        rename: Option<String>,
        #[serde(default)]
        file_checksum: Option<String>,
    },

    /// Fetch an archive and unpack it into a staging directory named
    /// after the archive stem, replacing any previous directory.
    ArchiveExtract {
        url: String,
        file_name: String,
        #[serde(default)]
        rename: Option<String>,
        #[serde(default)]
        file_checksum: Option<String>,
    },

    /// Copy font files from a staged directory into the bottle's Fonts
    /// directory.
    #[serde(alias = "install_cab_fonts")]
    InstallFonts { url: String, fonts: Vec<String> },

    /// Copy one file, or every file matching a glob, from a staged
    /// directory into the bottle's drive_c.
    #[serde(alias = "copy_cab_dll")]
    CopyDll {
        url: String,
        file_name: String,
        dest: String,
    },

    /// Register a DLL override in the bottle's Wine registry. When `url`
    /// points at a staged directory, `dll` may be a glob and each match
    /// gets its own override entry.
    OverrideDll {
        dll: String,
        #[serde(rename = "type")]
        override_type: String,
        #[serde(default)]
        url: Option<String>,
    },

    /// Write an arbitrary registry value.
    #[serde(rename = "set_register_key")]
    SetRegistryKey {
        key: String,
        value: String,
        data: String,
        #[serde(default, alias = "type")]
        key_type: Option<String>,
    },

    /// Register a font file under the Windows font registry key.
    RegisterFont { file: String, name: String },

    /// Any action this engine does not know. Kept so manifests written
    /// for newer engines still install their recognized steps.
    #[serde(other)]
    Unknown,
}

impl Step {
    /// The wire name of the step's action, as used in manifests, logs
    /// and reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Step::DeleteSys32Dlls { .. } => "delete_sys32_dlls",
            Step::InstallExe { .. } => "install_exe",
            Step::Uninstall { .. } => "uninstall",
            Step::CabExtract { .. } => "cab_extract",
            Step::ArchiveExtract { .. } => "archive_extract",
            Step::InstallFonts { .. } => "install_fonts",
            Step::CopyDll { .. } => "copy_dll",
            Step::OverrideDll { .. } => "override_dll",
            Step::SetRegistryKey { .. } => "set_register_key",
            Step::RegisterFont { .. } => "register_font",
            Step::Unknown => "unknown",
        }
    }

    /// Steps that place files directly into the bottle leave nothing an
    /// uninstaller could remove. Their presence in a manifest, whether
    /// or not they succeed, marks the dependency as not cleanly
    /// removable.
    pub fn leaves_no_uninstaller(&self) -> bool {
        matches!(
            self,
            Step::CabExtract { .. }
                | Step::ArchiveExtract { .. }
                | Step::InstallFonts { .. }
                | Step::CopyDll { .. }
        )
    }
}
