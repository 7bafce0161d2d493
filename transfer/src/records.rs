//! JSON record import.
//!
//! The accepted shape is a top-level array of objects. Each object becomes
//! one row whose columns are the object's own keys, so objects in the same
//! file may name different columns.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use dbkeeper_core::{RowMap, Value};

use crate::error::{Result, TransferError};

/// Reads JSON records from a file.
///
/// # Errors
///
/// Returns [`TransferError::InvalidJson`] if the document is not an array of
/// objects.
pub fn read_json_records(path: impl AsRef<Path>) -> Result<Vec<RowMap>> {
    let file = File::open(path)?;
    read_json_records_from(BufReader::new(file))
}

/// Reads JSON records from any reader.
///
/// # Examples
///
/// ```
/// use dbkeeper_core::Value;
/// use dbkeeper_transfer::read_json_records_from;
///
/// let rows = read_json_records_from(r#"[{"name": "Ann", "age": 31}]"#.as_bytes()).unwrap();
/// assert_eq!(rows[0]["name"], Value::from("Ann"));
/// assert_eq!(rows[0]["age"], Value::Integer(31));
/// ```
pub fn read_json_records_from<R: Read>(reader: R) -> Result<Vec<RowMap>> {
    let document: serde_json::Value = serde_json::from_reader(reader)?;
    let serde_json::Value::Array(items) = document else {
        return Err(TransferError::InvalidJson(
            "JSON data must be a list of objects".to_string(),
        ));
    };

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let serde_json::Value::Object(fields) = item else {
                return Err(TransferError::InvalidJson(format!(
                    "element {index} is not an object"
                )));
            };
            Ok(fields
                .iter()
                .map(|(key, value)| (key.clone(), Value::from_json(value)))
                .collect())
        })
        .collect()
}
