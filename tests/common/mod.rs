//! Shared fixtures for installer integration tests.

#![allow(dead_code)]

use cellar::bottle::BottleConfig;
use cellar::fetch::{FetchError, FetchRequest, Fetcher};
use cellar::manifest::{DependencyManifest, DependencyRef};
use cellar::observer::InstallObserver;
use cellar::repo::ManifestSource;
use cellar::runner::{Runner, RunnerError};
use cellar::snapshot::{SnapshotError, Snapshotter};
use std::collections::BTreeMap;
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Create a bottle directory skeleton under `root` and return its
/// config.
pub fn test_bottle(root: &Path, name: &str) -> BottleConfig {
    let config = BottleConfig::new(name, root.join(name));
    std::fs::create_dir_all(config.system32()).unwrap();
    std::fs::create_dir_all(config.fonts_dir()).unwrap();
    config.save().unwrap();
    config
}

/// Manifest source backed by an in-memory map.
#[derive(Default)]
pub struct StubSource {
    manifests: HashMap<String, DependencyManifest>,
}

impl StubSource {
    pub fn new() -> StubSource {
        StubSource::default()
    }

    pub fn with_manifest(name: &str, yaml: &str) -> StubSource {
        let mut source = StubSource::new();
        source.insert(name, yaml);
        source
    }

    pub fn insert(&mut self, name: &str, yaml: &str) {
        let manifest = DependencyManifest::from_yaml(yaml).unwrap();
        self.manifests.insert(name.to_string(), manifest);
    }
}

impl ManifestSource for StubSource {
    fn manifest(&self, dependency: &DependencyRef) -> Option<DependencyManifest> {
        self.manifests.get(&dependency.name).cloned()
    }
}

/// Fetcher serving canned bytes. URLs without an entry fail the way a
/// dead mirror would.
#[derive(Default)]
pub struct StubFetcher {
    files: HashMap<String, Vec<u8>>,
}

impl StubFetcher {
    pub fn new() -> StubFetcher {
        StubFetcher::default()
    }

    pub fn serve(mut self, url: &str, bytes: Vec<u8>) -> StubFetcher {
        self.files.insert(url.to_string(), bytes);
        self
    }
}

impl Fetcher for StubFetcher {
    fn fetch(&self, request: &FetchRequest<'_>, staging_dir: &Path) -> Result<PathBuf, FetchError> {
        let Some(bytes) = self.files.get(request.url) else {
            return Err(FetchError::Http {
                url: request.url.to_string(),
                reason: "connection refused".to_string(),
            });
        };
        let dest = staging_dir.join(request.staged_name());
        std::fs::write(&dest, bytes).map_err(|e| FetchError::Io {
            path: dest.display().to_string(),
            source: e,
        })?;
        Ok(dest)
    }
}

/// One call observed by [`RecordingRunner`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunnerCall {
    Executable {
        path: PathBuf,
        arguments: Option<String>,
        environment: BTreeMap<String, String>,
    },
    Command(String),
    Uninstaller(String),
    RegAdd {
        key: String,
        value: String,
        data: String,
        key_type: Option<String>,
    },
}

/// Runner that records calls instead of spawning Wine.
#[derive(Default)]
pub struct RecordingRunner {
    calls: Mutex<Vec<RunnerCall>>,
    uninstaller_listing: String,
}

impl RecordingRunner {
    pub fn new() -> RecordingRunner {
        RecordingRunner::default()
    }

    /// Runner whose `uninstaller --list` output is `listing`.
    pub fn with_listing(listing: &str) -> RecordingRunner {
        RecordingRunner {
            calls: Mutex::new(Vec::new()),
            uninstaller_listing: listing.to_string(),
        }
    }

    pub fn calls(&self) -> Vec<RunnerCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn reg_adds(&self) -> Vec<RunnerCall> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, RunnerCall::RegAdd { .. }))
            .collect()
    }

    fn record(&self, call: RunnerCall) {
        self.calls.lock().unwrap().push(call);
    }
}

impl Runner for RecordingRunner {
    fn run_executable(
        &self,
        _bottle: &BottleConfig,
        executable: &Path,
        arguments: Option<&str>,
        environment: &BTreeMap<String, String>,
    ) -> Result<(), RunnerError> {
        self.record(RunnerCall::Executable {
            path: executable.to_path_buf(),
            arguments: arguments.map(str::to_string),
            environment: environment.clone(),
        });
        Ok(())
    }

    fn run_command(&self, _bottle: &BottleConfig, command: &str) -> Result<String, RunnerError> {
        self.record(RunnerCall::Command(command.to_string()));
        Ok(self.uninstaller_listing.clone())
    }

    fn run_uninstaller(&self, _bottle: &BottleConfig, id: &str) -> Result<(), RunnerError> {
        self.record(RunnerCall::Uninstaller(id.to_string()));
        Ok(())
    }

    fn reg_add(
        &self,
        _bottle: &BottleConfig,
        key: &str,
        value: &str,
        data: &str,
        key_type: Option<&str>,
    ) -> Result<(), RunnerError> {
        self.record(RunnerCall::RegAdd {
            key: key.to_string(),
            value: value.to_string(),
            data: data.to_string(),
            key_type: key_type.map(str::to_string),
        });
        Ok(())
    }
}

/// Observer that journals callbacks as strings.
#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<String>>,
}

impl RecordingObserver {
    pub fn new() -> RecordingObserver {
        RecordingObserver::default()
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    fn push(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }
}

impl InstallObserver for RecordingObserver {
    fn started(&self, dependency: &str) {
        self.push(format!("started:{}", dependency));
    }

    fn finished(&self, dependency: &str) {
        self.push(format!("finished:{}", dependency));
    }

    fn fetch_failed(&self, dependency: &str) {
        self.push(format!("fetch_failed:{}", dependency));
    }

    fn step_error(&self, dependency: &str, _detail: &str) {
        self.push(format!("step_error:{}", dependency));
    }

    fn installed(&self, dependency: &str, removable: bool) {
        self.push(format!("installed:{}:removable={}", dependency, removable));
    }
}

/// Snapshotter that records labels, optionally failing every call.
#[derive(Default)]
pub struct StubSnapshotter {
    labels: Mutex<Vec<String>>,
    fail: bool,
}

impl StubSnapshotter {
    pub fn new() -> StubSnapshotter {
        StubSnapshotter::default()
    }

    pub fn failing() -> StubSnapshotter {
        StubSnapshotter {
            labels: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn labels(&self) -> Vec<String> {
        self.labels.lock().unwrap().clone()
    }
}

impl Snapshotter for StubSnapshotter {
    fn snapshot(&self, _bottle: &BottleConfig, label: &str) -> Result<(), SnapshotError> {
        if self.fail {
            return Err(SnapshotError("disk full".to_string()));
        }
        self.labels.lock().unwrap().push(label.to_string());
        Ok(())
    }
}

/// Build an in-memory zip archive from (name, contents) pairs.
pub fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default();
    for (name, bytes) in entries {
        writer.start_file(*name, options).unwrap();
        writer.write_all(bytes).unwrap();
    }
    writer.finish().unwrap().into_inner()
}
