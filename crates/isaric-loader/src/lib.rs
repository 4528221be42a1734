#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! ISARIC Project Loader
//!
//! # Modules
//!
//! - [`io`]: The [`Loader`] and [`load_data_from_file`]
//! - [`encoding`]: Supported text encodings

pub mod encoding;
pub mod io;

// Re-exports for convenience
pub use encoding::TextEncoding;
pub use io::{DEFAULT_ENCODING, Loader, METADATA_FILENAME, load_data_from_file, load_with};
