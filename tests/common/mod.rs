// Shared test helpers for integration tests
#![allow(dead_code)]

use serde_json::Value;
use spec_runner::config::{ConfigOverrides, EnvSnapshot, RunConfig, RunnerSettings};
use spec_runner::models::Document;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{TempDir, tempdir};

pub const PROJECT: &str = "demo";

/// A temporary workspace holding one project and a build directory.
pub struct Workspace {
    pub dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            dir: tempdir().expect("Failed to create temporary directory"),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn specs_dir(&self) -> PathBuf {
        self.root().join(PROJECT).join("tests").join("specs")
    }

    pub fn build_dir(&self) -> PathBuf {
        self.root().join("build")
    }

    pub fn results_dir(&self) -> PathBuf {
        self.build_dir().join("results")
    }

    /// Writes a declaration file relative to the specs root.
    pub fn write_spec(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.specs_dir().join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    /// A dev-mode configuration that keeps every output inside the workspace.
    pub fn config(&self) -> RunConfig {
        let overrides = ConfigOverrides {
            project: PROJECT.to_string(),
            workspace: Some(self.root().to_path_buf()),
            build_dir: Some(self.build_dir()),
            language: Some("en".to_string()),
        };
        let mut config = RunConfig::resolve(
            &RunnerSettings::default(),
            &EnvSnapshot::default(),
            &overrides,
        )
        .unwrap();
        // Dev mode appends the project; tests read results from one place.
        config.results_dir = self.results_dir();
        config
    }
}

/// Builds a document from a `json!` literal.
pub fn doc(value: Value) -> Document {
    match value {
        Value::Object(map) => map,
        other => panic!("expected a mapping, got {other}"),
    }
}

/// Reads a recorded `spec.json`.
pub fn read_record(path: &Path) -> Value {
    let content = fs::read_to_string(path).unwrap();
    serde_json::from_str(&content).unwrap()
}
