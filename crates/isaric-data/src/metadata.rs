//! Project metadata (`metadata.json`).
//!
//! The metadata names the files that make up a project:
//!
//! ```json
//! {
//!   "path": "projects/h5nx",
//!   "files": {
//!     "data_dictionary": {"filename": "data_dictionary.csv"},
//!     "presentation": {"filename": "presentation.csv"},
//!     "outcome": {},
//!     "events": {
//!       "treatment": {"filename": "events_treatment.csv", "encoding": "utf-8"}
//!     }
//!   }
//! }
//! ```
//!
//! Keys the toolkit does not use are kept in `extra` so the metadata can be
//! written back unchanged.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Parsed `metadata.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Project directory recorded in the metadata, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Files making up the project.
    #[serde(default)]
    pub files: FilesMetadata,

    /// All other top-level keys.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Metadata {
    /// Parse metadata from JSON text.
    pub fn from_json_str(s: &str) -> isaric_core::Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    /// The recorded project path, ignoring an empty string.
    pub fn recorded_path(&self) -> Option<&PathBuf> {
        self.path.as_ref().filter(|p| !p.as_os_str().is_empty())
    }
}

/// The `files` section of the metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilesMetadata {
    /// Data dictionary file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dictionary: Option<FileSpec>,

    /// Events tables, keyed by table name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub events: BTreeMap<String, FileSpec>,

    /// Every other table (presentation, outcome, daily, ...), keyed by name.
    #[serde(flatten)]
    pub tables: BTreeMap<String, FileSpec>,
}

impl FilesMetadata {
    /// Find the file entry for a table.
    ///
    /// Top-level tables are checked before events tables. Empty entries
    /// count as not listed.
    pub fn lookup(&self, name: &str) -> Option<&FileSpec> {
        self.tables
            .get(name)
            .filter(|spec| !spec.is_empty())
            .or_else(|| self.events.get(name).filter(|spec| !spec.is_empty()))
    }

    /// Names of the listed events tables, in sorted order.
    pub fn event_names(&self) -> Vec<&str> {
        self.events.keys().map(String::as_str).collect()
    }

    /// Returns `true` if `name` is an events table.
    pub fn is_event(&self, name: &str) -> bool {
        self.events.contains_key(name)
    }
}

/// Where and how to read one file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileSpec {
    /// File name relative to the project directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,

    /// Text encoding of the file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encoding: Option<String>,

    /// Any other keys.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl FileSpec {
    /// Creates an entry for the given file name.
    pub fn with_filename(filename: impl Into<String>) -> Self {
        Self {
            filename: Some(filename.into()),
            ..Self::default()
        }
    }

    /// Returns `true` if the entry has no keys at all.
    pub fn is_empty(&self) -> bool {
        self.filename.is_none() && self.encoding.is_none() && self.extra.is_empty()
    }

    /// The configured file name, or `default`.
    pub fn filename_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.filename.as_deref().unwrap_or(default)
    }

    /// The configured encoding, or `default`.
    pub fn encoding_or<'a>(&'a self, default: &'a str) -> &'a str {
        self.encoding.as_deref().unwrap_or(default)
    }
}
