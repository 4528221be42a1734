//! Text encodings accepted for project files.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use isaric_core::{Error, Result};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// A supported text encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextEncoding {
    /// Plain UTF-8; a byte order mark is kept as part of the text.
    #[default]
    Utf8,
    /// UTF-8 with an optional leading byte order mark, which is dropped.
    Utf8Sig,
}

impl TextEncoding {
    /// The canonical name of the encoding.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Utf8 => "utf-8",
            Self::Utf8Sig => "utf-8-sig",
        }
    }

    /// Decode file contents read from `path`.
    pub fn decode(&self, bytes: Vec<u8>, path: &Path) -> Result<String> {
        let bytes = match self {
            Self::Utf8Sig if bytes.starts_with(UTF8_BOM) => bytes[UTF8_BOM.len()..].to_vec(),
            _ => bytes,
        };
        String::from_utf8(bytes).map_err(|e| {
            Error::parse(format!(
                "{} is not valid {}: {e}",
                path.display(),
                self.name()
            ))
        })
    }
}

impl FromStr for TextEncoding {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "utf-8" | "utf8" => Ok(Self::Utf8),
            "utf-8-sig" | "utf8-sig" => Ok(Self::Utf8Sig),
            _ => Err(Error::UnsupportedEncoding {
                encoding: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
