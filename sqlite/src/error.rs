//! Error types for table editing operations.
//!
//! The first four variants are the caller-facing failure kinds of the
//! editing core; the rest wrap lower layers.

use std::path::PathBuf;

use dbkeeper_core::ValidationError;
use dbkeeper_transfer::TransferError;
use thiserror::Error;

/// Errors that can occur while inspecting, editing or undoing.
#[derive(Debug, Error)]
pub enum ManagerError {
    /// Table or column metadata is unavailable (e.g. the table does not exist).
    #[error("schema error: {0}")]
    SchemaError(String),

    /// Malformed caller input.
    #[error("validation error: {0}")]
    ValidationError(#[from] ValidationError),

    /// The engine rejected a mutating statement, or a keyed statement matched
    /// the wrong number of rows.
    #[error("mutation error: {0}")]
    MutationError(String),

    /// Undo was requested with nothing recorded.
    #[error("no operation to undo")]
    NoPendingOperationError,

    /// SQLite failure outside a mutating statement (open, read, commit).
    #[error("database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    /// Import or export file failure.
    #[error("transfer error: {0}")]
    TransferError(#[from] TransferError),

    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Refused to create a database or backup over an existing file.
    #[error("file already exists: {}", .0.display())]
    AlreadyExists(PathBuf),
}

/// Convenience alias for results with [`ManagerError`].
pub type Result<T> = std::result::Result<T, ManagerError>;
