//! Error types for file import, export and configuration.

use thiserror::Error;

/// Errors that can occur while reading or writing transfer files.
#[derive(Debug, Error)]
pub enum TransferError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// CSV parsing or writing failure.
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),

    /// JSON parsing failure.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// JSON input is well-formed but not a list of objects.
    #[error("invalid JSON import: {0}")]
    InvalidJson(String),

    /// CSV input has no header line.
    #[error("CSV file has no header row")]
    MissingHeader,
}

/// Convenience alias for results with [`TransferError`].
pub type Result<T> = std::result::Result<T, TransferError>;
