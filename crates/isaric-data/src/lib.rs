#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! ISARIC Data Model
//!
//! Types describing one ISARIC project once it has been read from disk.
//!
//! # Modules
//!
//! - [`metadata`]: The project's `metadata.json`
//! - [`dictionary`]: Data dictionary entries, field types and options
//! - [`core`]: The [`IsaricData`] container
//! - [`validate`]: Validation of data against the dictionary
//! - [`summary`]: Descriptive statistics

pub mod core;
pub mod dictionary;
pub mod metadata;
pub mod summary;
pub mod validate;

// Re-exports for convenience
pub use crate::core::{DAILY, IsaricData, OUTCOME, PRESENTATION};
pub use dictionary::{
    DataDictionary, DictionaryEntry, FieldOption, FieldType, parse_field_options,
};
pub use isaric_core::{Error, Result};
pub use metadata::{FileSpec, FilesMetadata, Metadata};
pub use summary::{ColumnStats, ColumnSummary, DataSummary, TableSummary};
pub use validate::{Severity, ValidationIssue, ValidationReport};
