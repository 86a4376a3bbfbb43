use std::path::PathBuf;

use crate::error::Error;

/// A parsed `KEY=VALUE` entry from a dotenv file or input buffer.
///
/// `value` holds the resolved value: quotes stripped and, for double-quoted
/// content, `\n`/`\r` sequences expanded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub key: String,
    pub value: String,
    pub source: Option<PathBuf>,
    pub line: u32,
}

/// Summary of a load operation.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub loaded: usize,
    pub skipped_existing: usize,
    pub files_read: usize,
    /// Per-path failures collected while other paths kept loading.
    pub errors: Vec<PathError>,
}

/// A failure tied to one configured dotenv path.
#[derive(Debug)]
pub struct PathError {
    pub path: PathBuf,
    pub error: Error,
}

/// Encoding choice for input data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    /// UTF-8 text input, validated strictly.
    #[default]
    Utf8,
    /// ISO-8859-1 text input; every byte maps to a code point.
    Latin1,
}

impl Encoding {
    /// Parse an encoding name as accepted by the loader options.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "utf8" | "utf-8" => Some(Self::Utf8),
            "latin1" | "iso-8859-1" => Some(Self::Latin1),
            _ => None,
        }
    }
}
