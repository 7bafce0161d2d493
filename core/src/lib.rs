//! Core types for schema-agnostic SQLite table editing.
//!
//! This crate holds everything about tables that does not need a database
//! connection:
//!
//! - [`Value`], [`Row`], [`RowSet`]: loosely typed cells and rows, aligned
//!   positionally with a runtime-discovered column list.
//! - [`ColumnInfo`] and [`PrimaryKey`]: column metadata and the key used to
//!   address single rows.
//! - [`UndoRecord`]: a description of one completed mutation, sufficient to
//!   compute its inverse.
//! - The row codec ([`encode`], [`decode`], [`effective_primary_key`]).
//! - Identifier validation ([`validate_identifier`]) applied before any name
//!   is placed into statement text.
//!
//! # Example
//!
//! ```
//! use dbkeeper_core::*;
//!
//! let columns = vec![
//!     ColumnInfo {
//!         cid: 0,
//!         name: "id".into(),
//!         declared_type: "INTEGER".into(),
//!         not_null: false,
//!         default_value: None,
//!         primary_key: true,
//!     },
//!     ColumnInfo {
//!         cid: 1,
//!         name: "name".into(),
//!         declared_type: "TEXT".into(),
//!         not_null: false,
//!         default_value: None,
//!         primary_key: false,
//!     },
//! ];
//!
//! assert_eq!(effective_primary_key(&columns), PrimaryKey::Column("id".into()));
//!
//! let row = encode(&["id", "name"], vec![Value::Integer(1), Value::from("Ann")]).unwrap();
//! let map = decode(&row, &columns).unwrap();
//! assert_eq!(map["name"], Value::from("Ann"));
//! ```

mod codec;
mod record;
mod types;
mod validate;

pub use codec::{RowMap, column_names, decode, effective_primary_key, encode, rowid_alias};
pub use record::UndoRecord;
pub use types::*;
pub use validate::{
    ValidationError, quote_identifier, validate_definition_text, validate_identifier,
    validate_table_name,
};
