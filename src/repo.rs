//! Dependency repository client.
//!
//! Manifests live in a remote repository laid out as
//! `<base>/<category>/<name>.yml` with a catalog at `<base>/index.yml`.
//! Resolution is deliberately forgiving: network failures, missing
//! files and malformed YAML all collapse to "not available", with a
//! warning on stderr, so a broken repository entry degrades to a
//! skipped dependency instead of an engine failure.

use crate::fetch::http_timeout;
use crate::manifest::{DependencyManifest, DependencyRef};
use crate::output;
use serde::Deserialize;
use std::collections::BTreeMap;

/// Upstream manifest repository used when none is configured.
pub const DEFAULT_REPO_URL: &str =
    "https://raw.githubusercontent.com/bottlesdevs/dependencies/main";

/// Resolves dependency references to manifests.
///
/// The step executor only needs this one operation; tests implement it
/// with an in-memory map.
pub trait ManifestSource {
    fn manifest(&self, dependency: &DependencyRef) -> Option<DependencyManifest>;
}

/// One catalog row from `index.yml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CatalogEntry {
    pub category: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// HTTP client for one manifest repository.
#[derive(Debug, Clone)]
pub struct DependencyRepo {
    base_url: String,
}

impl DependencyRepo {
    pub fn new(base_url: impl Into<String>) -> DependencyRepo {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        DependencyRepo { base_url }
    }

    /// Repository from `CELLAR_REPO_URL`, or the default upstream.
    pub fn from_env() -> DependencyRepo {
        match std::env::var("CELLAR_REPO_URL") {
            Ok(url) => DependencyRepo::new(url),
            Err(_) => DependencyRepo::new(DEFAULT_REPO_URL),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn manifest_url(&self, dependency: &DependencyRef) -> String {
        format!(
            "{}/{}/{}.yml",
            self.base_url, dependency.category, dependency.name
        )
    }

    fn get(&self, url: &str) -> Option<String> {
        let response = match ureq::get(url).timeout(http_timeout()).call() {
            Ok(response) => response,
            Err(e) => {
                output::warning(&format!("repository fetch failed for {}: {}", url, e));
                return None;
            }
        };
        match response.into_string() {
            Ok(text) => Some(text),
            Err(e) => {
                output::warning(&format!("cannot read repository response for {}: {}", url, e));
                None
            }
        }
    }

    /// Raw manifest YAML, for display.
    pub fn manifest_text(&self, dependency: &DependencyRef) -> Option<String> {
        self.get(&self.manifest_url(dependency))
    }

    /// The catalog of available dependencies, name to entry. Failures
    /// collapse to an empty catalog.
    pub fn catalog(&self) -> BTreeMap<String, CatalogEntry> {
        let url = format!("{}/index.yml", self.base_url);
        let Some(text) = self.get(&url) else {
            return BTreeMap::new();
        };
        match serde_yaml::from_str(&text) {
            Ok(catalog) => catalog,
            Err(e) => {
                output::warning(&format!("invalid repository catalog: {}", e));
                BTreeMap::new()
            }
        }
    }

    /// Look a dependency up in the catalog to learn its category.
    pub fn find(&self, name: &str) -> Option<DependencyRef> {
        let entry = self.catalog().remove(name)?;
        Some(DependencyRef::new(name, entry.category))
    }
}

impl ManifestSource for DependencyRepo {
    fn manifest(&self, dependency: &DependencyRef) -> Option<DependencyManifest> {
        let text = self.manifest_text(dependency)?;
        match DependencyManifest::from_yaml(&text) {
            Ok(manifest) => Some(manifest),
            Err(e) => {
                output::warning(&format!("invalid manifest for {}: {}", dependency, e));
                None
            }
        }
    }
}
