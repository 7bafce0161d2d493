//! File formats and configuration for dbkeeper.
//!
//! Nothing in this crate touches a database. It turns files into rows and
//! rows into files; the `dbkeeper-sqlite` crate decides how those rows are
//! written to or read from a table.
//!
//! - CSV: [`read_csv`] / [`write_csv`]
//! - JSON records: [`read_json_records`]
//! - Schema export text: [`render_database_schema`]
//! - YAML configuration: [`ManagerConfig`]
//!
//! # Quick start
//!
//! ```
//! use dbkeeper_core::{Row, Value};
//! use dbkeeper_transfer::{read_csv_from, write_csv_to};
//!
//! let mut out = Vec::new();
//! let rows = vec![Row::new(vec![Value::Integer(1), Value::from("Ann")])];
//! write_csv_to(&mut out, &["id".into(), "name".into()], &rows).unwrap();
//!
//! let table = read_csv_from(out.as_slice()).unwrap();
//! assert_eq!(table.records, vec![vec!["1".to_string(), "Ann".to_string()]]);
//! ```

mod config;
mod delimited;
mod error;
mod records;
mod schema_text;

pub use config::{DEFAULT_HISTORY_LIMIT, ManagerConfig};
pub use delimited::{CsvTable, read_csv, read_csv_from, write_csv, write_csv_to};
pub use error::{Result, TransferError};
pub use records::{read_json_records, read_json_records_from};
pub use schema_text::{render_database_schema, render_table_schema};
