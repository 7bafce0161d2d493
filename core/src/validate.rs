//! Caller-input validation.
//!
//! Table and column names have to be interpolated into statement text, so
//! every identifier passes a conservative allow-list before it reaches the
//! engine: an ASCII letter or underscore followed by ASCII letters, digits
//! or underscores. Values are never interpolated and are not checked here.
//!
//! # Examples
//!
//! ```
//! use dbkeeper_core::{ValidationError, validate_identifier, validate_table_name};
//!
//! assert!(validate_identifier("order_items").is_ok());
//! assert_eq!(
//!     validate_identifier("name; DROP TABLE x"),
//!     Err(ValidationError::InvalidIdentifier("name; DROP TABLE x".into()))
//! );
//! assert_eq!(validate_table_name(""), Err(ValidationError::EmptyTableName));
//! ```

use thiserror::Error;

/// Malformed caller input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Table name is empty or whitespace-only.
    #[error("table name cannot be empty")]
    EmptyTableName,
    /// Identifier contains characters outside the allow-list.
    #[error("invalid identifier '{0}': use letters, digits and underscores only")]
    InvalidIdentifier(String),
    /// Column/value sequences of different lengths.
    #[error("expected {expected} values, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
    /// An update named no columns.
    #[error("at least one column is required")]
    EmptyColumnList,
    /// A delete named no keys.
    #[error("at least one primary key value is required")]
    EmptyKeySet,
    /// Statement text is empty.
    #[error("statement text cannot be empty")]
    EmptyStatement,
    /// A column type or constraint clause contains disallowed text.
    #[error("invalid column definition '{0}'")]
    InvalidColumnDefinition(String),
}

/// Checks a table or column name against the identifier allow-list.
pub fn validate_identifier(name: &str) -> Result<(), ValidationError> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    if !valid_start || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(ValidationError::InvalidIdentifier(name.to_string()));
    }
    Ok(())
}

/// Checks a table name: non-empty, then the identifier allow-list.
pub fn validate_table_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyTableName);
    }
    validate_identifier(name)
}

/// Checks free-form column-definition text (declared type or constraints).
///
/// Parentheses, commas, quotes, dots, minus signs and spaces are allowed so
/// that `VARCHAR(20)`, `DEFAULT 'x'` or `CHECK (qty > -1)` pass; statement
/// terminators and comment markers do not.
pub fn validate_definition_text(text: &str) -> Result<(), ValidationError> {
    let allowed = |c: char| {
        c.is_ascii_alphanumeric() || matches!(c, '_' | ' ' | '(' | ')' | ',' | '\'' | '.' | '-' | '>' | '<' | '=')
    };
    if text.contains("--") || !text.chars().all(allowed) {
        return Err(ValidationError::InvalidColumnDefinition(text.to_string()));
    }
    Ok(())
}

/// Double-quotes an identifier that already passed [`validate_identifier`].
pub fn quote_identifier(name: &str) -> String {
    format!("\"{name}\"")
}
