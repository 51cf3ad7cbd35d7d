//! CSV ingest and export.
//!
//! Ingest is strictly typed: the caller supplies one [`ColumnType`] per header
//! column and every field is parsed against it. There is no type inference.

pub(crate) mod csv_reader;
pub(crate) mod csv_writer;
mod parse;

pub use csv_reader::CsvIngester;

use crate::types::{DEFAULT_DATE_FORMAT, DEFAULT_DATE_TIME_FORMAT, DEFAULT_TIME_FORMAT};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tokens that read as a missing cell, in addition to the empty field
pub const DEFAULT_MISSING_TOKENS: [&str; 7] = ["NA", "N/A", "NaN", "nan", "null", "NULL", "*"];

/// CSV dialect and literal formats used by ingest
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CsvConfig {
    pub delimiter: char,
    pub quote: char,
    /// Trim surrounding whitespace from headers and fields
    pub trim: bool,
    /// Lines starting with this character are skipped
    pub comment: Option<char>,
    pub missing_tokens: Vec<String>,
    pub date_format: String,
    pub time_format: String,
    pub date_time_format: String,
}

impl Default for CsvConfig {
    fn default() -> Self {
        Self {
            delimiter: ',',
            quote: '"',
            trim: true,
            comment: None,
            missing_tokens: DEFAULT_MISSING_TOKENS.iter().map(|t| t.to_string()).collect(),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            time_format: DEFAULT_TIME_FORMAT.to_string(),
            date_time_format: DEFAULT_DATE_TIME_FORMAT.to_string(),
        }
    }
}

impl CsvConfig {
    /// Load a JSON config; absent fields take their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text)
            .map_err(|e| Error::Config(format!("Invalid CSV config {}: {}", path.display(), e)))
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn with_missing_tokens<S: Into<String>>(mut self, tokens: impl IntoIterator<Item = S>) -> Self {
        self.missing_tokens = tokens.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_missing_token(&self, text: &str) -> bool {
        text.is_empty() || self.missing_tokens.iter().any(|t| t == text)
    }
}

/// The csv crate works in bytes; only ASCII dialect characters are supported
pub(crate) fn dialect_byte(c: char, field: &str) -> Result<u8> {
    if c.is_ascii() {
        Ok(c as u8)
    } else {
        Err(Error::Config(format!("CSV {} must be an ASCII character, got '{}'", field, c)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_csv_config_default() {
        let config = CsvConfig::default();
        assert_eq!(config.delimiter, ',');
        assert_eq!(config.quote, '"');
        assert!(config.trim);
        assert!(config.is_missing_token(""));
        assert!(config.is_missing_token("NA"));
        assert!(!config.is_missing_token("na"));
    }

    #[test]
    fn test_config_from_json_fills_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{ "delimiter": ";", "date_format": "%d/%m/%Y" }}"#).unwrap();

        let config = CsvConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.delimiter, ';');
        assert_eq!(config.date_format, "%d/%m/%Y");
        assert_eq!(config.time_format, DEFAULT_TIME_FORMAT);
        assert_eq!(config.missing_tokens.len(), DEFAULT_MISSING_TOKENS.len());
    }

    #[test]
    fn test_config_from_bad_json() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{{ not json").unwrap();
        assert!(matches!(
            CsvConfig::from_json_file(file.path()),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_dialect_byte() {
        assert_eq!(dialect_byte('\t', "delimiter").unwrap(), b'\t');
        assert!(dialect_byte('§', "delimiter").is_err());
    }
}
