//! Common test utilities for loader integration tests.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Directory of the synthetic project fixture.
pub fn fixture_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/data")
}

/// A writable copy of the fixture project.
pub struct ProjectCopy {
    /// Keeps the directory alive for the test's duration.
    pub dir: TempDir,
}

impl ProjectCopy {
    /// Copies every fixture file into a fresh temporary directory.
    pub fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        for entry in fs::read_dir(fixture_dir()).expect("Fixture directory missing") {
            let entry = entry.unwrap();
            fs::copy(entry.path(), dir.path().join(entry.file_name())).unwrap();
        }
        Self { dir }
    }

    /// The project directory.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Replaces one file's contents.
    pub fn write(&self, name: &str, contents: &str) {
        fs::write(self.path().join(name), contents).unwrap();
    }

    /// Deletes one file.
    pub fn remove(&self, name: &str) {
        fs::remove_file(self.path().join(name)).unwrap();
    }

    /// Rewrites `metadata.json` through a JSON edit.
    pub fn edit_metadata(&self, edit: impl FnOnce(&mut serde_json::Value)) {
        let path = self.path().join("metadata.json");
        let mut json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        edit(&mut json);
        fs::write(path, serde_json::to_string_pretty(&json).unwrap()).unwrap();
    }
}

impl Default for ProjectCopy {
    fn default() -> Self {
        Self::new()
    }
}
