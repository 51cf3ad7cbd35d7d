use crate::types::ColumnType;
use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Every failure the crate reports
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Malformed row {row}: expected at least {expected} fields, found {found}")]
    MalformedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("Cannot parse '{text}' as {column_type} in column '{column}' at row {row}")]
    TypeParse {
        row: usize,
        column: String,
        column_type: ColumnType,
        text: String,
    },

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Duplicate column name: {0}")]
    DuplicateName(String),

    #[error("Length mismatch for column '{column}': expected {expected} rows, found {actual}")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("Index {index} out of range for length {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Corrupted store file {path}: {reason}")]
    Corrupted { path: String, reason: String },

    #[error("Checksum mismatch - expected: {expected}, actual: {actual}")]
    ChecksumMismatch { expected: u32, actual: u32 },
}

impl Error {
    /// Stable negative code for each variant
    pub fn error_code(&self) -> i32 {
        match self {
            Error::Io(_) => -1,
            Error::Config(_) => -2,
            Error::MalformedRow { .. } => -3,
            Error::TypeParse { .. } => -4,
            Error::ColumnNotFound(_) => -5,
            Error::DuplicateName(_) => -6,
            Error::LengthMismatch { .. } => -7,
            Error::IndexOutOfRange { .. } => -8,
            Error::TypeMismatch(_) => -9,
            Error::Csv(_) => -10,
            Error::Serialization(_) => -11,
            Error::Corrupted { .. } => -12,
            Error::ChecksumMismatch { .. } => -13,
        }
    }

    pub(crate) fn corrupted(path: &std::path::Path, reason: impl Into<String>) -> Self {
        Error::Corrupted {
            path: path.display().to_string(),
            reason: reason.into(),
        }
    }
}
