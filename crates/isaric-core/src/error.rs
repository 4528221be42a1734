//! Error types shared by the ISARIC analytics crates.

use std::path::{Path, PathBuf};

/// Errors that can occur while loading, validating, or transforming
/// ISARIC project data.
///
/// All error variants are marked with `#[non_exhaustive]` to allow
/// adding new error types without breaking changes.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// I/O error without path context.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// I/O error on a known path.
    #[error("I/O error at {path}: {source}")]
    IoWithPath {
        /// Path that was being read or written
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A required file does not exist.
    #[error("File not found: {path}")]
    FileNotFound {
        /// Missing path
        path: PathBuf,
    },

    /// A project path exists but is not a directory.
    #[error("Not a directory: {path}")]
    NotADirectory {
        /// Offending path
        path: PathBuf,
    },

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV reading/writing error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config {
        /// What configuration is problematic
        message: String,
    },

    /// Data failed validation against the schema or data dictionary.
    #[error("Validation error: {message}")]
    Validation {
        /// Field or aspect that failed validation
        field: Option<String>,
        /// What went wrong
        message: String,
    },

    /// A loader step was called before the step it depends on.
    #[error("{what} must be loaded first")]
    NotLoaded {
        /// What has not been loaded yet (e.g. "metadata")
        what: &'static str,
    },

    /// Table name is not part of the project.
    #[error("Unknown table: {name}")]
    UnknownTable {
        /// Requested table name
        name: String,
    },

    /// Field is not present in a table or in the data dictionary.
    #[error("Unknown field: {field}{}", table.as_deref().map(|t| format!(" (table {t})")).unwrap_or_default())]
    UnknownField {
        /// Requested field name
        field: String,
        /// Table that was searched, if any
        table: Option<String>,
    },

    /// Field name already exists.
    #[error("Duplicate field {field}{}", table.as_deref().map(|t| format!(" in table {t}")).unwrap_or_default())]
    DuplicateField {
        /// Duplicated field name
        field: String,
        /// Table holding the field, if known
        table: Option<String>,
    },

    /// Column or mask length does not match the table.
    #[error("Length mismatch: expected {expected} values, got {actual}")]
    LengthMismatch {
        /// Expected number of values
        expected: usize,
        /// Number of values supplied
        actual: usize,
    },

    /// The `path` key in metadata.json points somewhere else.
    #[error("metadata path {metadata_path} does not match project path {loader_path}")]
    MetadataPathMismatch {
        /// Path recorded in metadata.json
        metadata_path: PathBuf,
        /// Path the loader was created with
        loader_path: PathBuf,
    },

    /// Text encoding is not supported.
    #[error("Unsupported encoding: {encoding}")]
    UnsupportedEncoding {
        /// Requested encoding name
        encoding: String,
    },

    /// Parse error (skip logic, field options, dates).
    #[error("Parse error: {message}")]
    Parse {
        /// Description of the parse failure
        message: String,
    },

    /// Unknown encoding method name.
    #[error("Unknown encoding method: {method}")]
    UnknownMethod {
        /// Requested method name
        method: String,
    },

    /// A value could not be encoded.
    #[error("Cannot encode field {field}: {message}")]
    Encoding {
        /// Field being encoded
        field: String,
        /// What went wrong
        message: String,
    },
}

/// Convenience `Result` type alias for ISARIC analytics operations.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns whether this error was caused by the contents of the project
    /// (bad metadata, dictionary, or data) rather than the environment.
    pub fn is_user_error(&self) -> bool {
        match self {
            Error::Io(_) | Error::IoWithPath { .. } => false,
            Error::FileNotFound { .. } | Error::NotADirectory { .. } => true,
            Error::Json(_) | Error::Csv(_) => true,
            Error::Config { .. } => true,
            Error::Validation { .. } => true,
            Error::NotLoaded { .. } => false,
            Error::UnknownTable { .. }
            | Error::UnknownField { .. }
            | Error::DuplicateField { .. }
            | Error::LengthMismatch { .. } => true,
            Error::MetadataPathMismatch { .. } => true,
            Error::UnsupportedEncoding { .. } => true,
            Error::Parse { .. } => true,
            Error::UnknownMethod { .. } => true,
            Error::Encoding { .. } => true,
        }
    }

    /// Creates an I/O error carrying the path it occurred on.
    pub fn io_with_path(source: std::io::Error, path: impl AsRef<Path>) -> Self {
        Error::IoWithPath {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Creates a new validation error.
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Error::Validation {
            field: None,
            message: message.into(),
        }
    }

    /// Creates a new validation error with a field name.
    pub fn validation_field<F, M>(field: F, message: M) -> Self
    where
        F: Into<String>,
        M: Into<String>,
    {
        Error::Validation {
            field: Some(field.into()),
            message: message.into(),
        }
    }

    /// Creates a new configuration error.
    pub fn config<S: Into<String>>(message: S) -> Self {
        Error::Config {
            message: message.into(),
        }
    }

    /// Creates a new parse error.
    pub fn parse<S: Into<String>>(message: S) -> Self {
        Error::Parse {
            message: message.into(),
        }
    }

    /// Creates an unknown-field error, optionally scoped to a table.
    pub fn unknown_field<S: Into<String>>(field: S, table: Option<&str>) -> Self {
        Error::UnknownField {
            field: field.into(),
            table: table.map(str::to_string),
        }
    }

    /// Creates a duplicate-field error, optionally scoped to a table.
    pub fn duplicate_field<S: Into<String>>(field: S, table: Option<&str>) -> Self {
        Error::DuplicateField {
            field: field.into(),
            table: table.map(str::to_string),
        }
    }

    /// Names the table of a field error raised without one.
    ///
    /// [`Table`](crate::Table) does not know its own name, so its
    /// `UnknownField` and `DuplicateField` errors carry none; callers that
    /// do know it attach it here. Other errors pass through unchanged.
    pub fn with_table(self, table_name: &str) -> Self {
        match self {
            Error::UnknownField { field, table: None } => {
                Error::unknown_field(field, Some(table_name))
            }
            Error::DuplicateField { field, table: None } => {
                Error::duplicate_field(field, Some(table_name))
            }
            other => other,
        }
    }

    /// Creates a new encoding error.
    pub fn encoding<F, M>(field: F, message: M) -> Self
    where
        F: Into<String>,
        M: Into<String>,
    {
        Error::Encoding {
            field: field.into(),
            message: message.into(),
        }
    }
}
