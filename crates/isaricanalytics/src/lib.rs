//! ISARIC analytics toolkit, umbrella crate.
//!
//! This crate re-exports all ISARIC analytics components for convenience.
//! Enable the `cli` feature for the command handlers.

#![doc = include_str!("../README.md")]

pub use isaric_cleaning as cleaning;
pub use isaric_core as core;
pub use isaric_data as data;
pub use isaric_loader as loader;

#[cfg(feature = "cli")]
pub use isaric_cli as cli;

// Re-exports for convenience
pub use isaric_core::{Error, Result, Table, Value};
pub use isaric_data::{DataDictionary, IsaricData};
pub use isaric_loader::load_data_from_file;
