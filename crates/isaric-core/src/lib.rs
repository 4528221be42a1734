#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! ISARIC Core Library
//!
//! Shared error type, tabular values, and string utilities used by every
//! ISARIC analytics crate. It has no internal dependencies.
//!
//! # Modules
//!
//! - [`error`]: Error types and Result alias
//! - [`value`]: Cell values and text parsing
//! - [`table`]: Column-oriented tables
//! - [`util`]: String sanitising

pub mod error;
pub mod table;
pub mod util;
pub mod value;

// Re-exports for convenience
pub use error::{Error, Result};
pub use table::{Column, Row, Table};
pub use util::sanitise::{sanitise_string, sanitise_values};
pub use value::Value;

/// Name of the subject identifier column carried by every project table.
pub const SUBJECT_ID_FIELD: &str = "subjid";
