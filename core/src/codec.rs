//! Conversions between column lists and positional rows.
//!
//! The codec zips names with values and back, checking lengths, and
//! derives a table's effective primary key from its column metadata. Values
//! pass through untouched: whether `"17"` is stored as text or integer is
//! left to the engine's column affinity.

use indexmap::IndexMap;

use crate::types::{ColumnInfo, PrimaryKey, Row, Value};
use crate::validate::ValidationError;

/// Column name → value, in column order.
pub type RowMap = IndexMap<String, Value>;

/// Builds a [`Row`] from caller-supplied column names and raw values.
///
/// # Errors
///
/// Returns [`ValidationError::LengthMismatch`] when the two sequences differ
/// in length.
///
/// # Examples
///
/// ```
/// use dbkeeper_core::{Value, encode};
///
/// let row = encode(&["id", "name"], vec![Value::Integer(1), Value::from("Ann")]).unwrap();
/// assert_eq!(row.len(), 2);
/// assert!(encode(&["id"], vec![]).is_err());
/// ```
pub fn encode<S: AsRef<str>>(columns: &[S], values: Vec<Value>) -> Result<Row, ValidationError> {
    check_lengths(columns.len(), values.len())?;
    Ok(Row::new(values))
}

/// Maps each value of `row` to its column name.
///
/// # Errors
///
/// Returns [`ValidationError::LengthMismatch`] when the row is not exactly as
/// wide as the column list.
///
/// # Examples
///
/// ```
/// use dbkeeper_core::{ColumnInfo, Row, Value, decode};
///
/// let columns = vec![ColumnInfo {
///     cid: 0,
///     name: "name".into(),
///     declared_type: "TEXT".into(),
///     not_null: false,
///     default_value: None,
///     primary_key: false,
/// }];
/// let map = decode(&Row::new(vec![Value::from("Ann")]), &columns).unwrap();
/// assert_eq!(map["name"], Value::from("Ann"));
/// ```
pub fn decode(row: &Row, columns: &[ColumnInfo]) -> Result<RowMap, ValidationError> {
    check_lengths(columns.len(), row.len())?;
    Ok(columns
        .iter()
        .zip(row.values())
        .map(|(col, value)| (col.name.clone(), value.clone()))
        .collect())
}

/// Returns the first declared primary-key column in declaration order, or
/// [`PrimaryKey::RowId`] if the table declares none.
pub fn effective_primary_key(columns: &[ColumnInfo]) -> PrimaryKey {
    let mut ordered: Vec<&ColumnInfo> = columns.iter().collect();
    ordered.sort_by_key(|c| c.cid);
    ordered
        .into_iter()
        .find(|c| c.primary_key)
        .map(|c| PrimaryKey::Column(c.name.clone()))
        .unwrap_or(PrimaryKey::RowId)
}

/// The column that aliases the rowid, if any.
///
/// Only a sole `INTEGER PRIMARY KEY` column of a rowid table qualifies; such a
/// column is assigned by the engine when omitted from an insert. Columns of a
/// composite key and keys of `WITHOUT ROWID` tables never alias the rowid.
pub fn rowid_alias(columns: &[ColumnInfo], has_rowid: bool) -> Option<&ColumnInfo> {
    if !has_rowid {
        return None;
    }
    let mut keys = columns.iter().filter(|c| c.primary_key);
    match (keys.next(), keys.next()) {
        (Some(key), None) if key.declared_type.eq_ignore_ascii_case("INTEGER") => Some(key),
        _ => None,
    }
}

/// Column names of a metadata sequence, in order.
pub fn column_names(columns: &[ColumnInfo]) -> Vec<String> {
    columns.iter().map(|c| c.name.clone()).collect()
}

fn check_lengths(expected: usize, actual: usize) -> Result<(), ValidationError> {
    if expected != actual {
        return Err(ValidationError::LengthMismatch { expected, actual });
    }
    Ok(())
}
