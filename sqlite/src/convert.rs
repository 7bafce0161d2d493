//! Conversion between [`Value`]/[`Row`] and SQLite rows.
//!
//! Also hosts the small read/write helpers every other module goes
//! through, so that values are always bound positionally and rows are
//! always decoded the same way.

use dbkeeper_core::{ColumnInfo, KeyedRow, Row, RowSet, Value, column_names, effective_primary_key};
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{Connection, params_from_iter};
use tracing::debug;

use crate::error::{ManagerError, Result};
use crate::statement::{self, Statement};

/// Converts a cell value into an owned SQLite value for binding.
pub(crate) fn to_sql(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Integer(i) => SqlValue::Integer(*i),
        Value::Real(r) => SqlValue::Real(*r),
        Value::Text(s) => SqlValue::Text(s.clone()),
        Value::Blob(b) => SqlValue::Blob(b.clone()),
    }
}

/// Converts a borrowed SQLite value into a cell value.
///
/// Text that is not valid UTF-8 is decoded lossily.
pub(crate) fn from_sql(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(r) => Value::Real(r),
        ValueRef::Text(bytes) => Value::Text(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::Blob(bytes.to_vec()),
    }
}

/// Reads columns `start..end` of a result row.
pub(crate) fn read_row(row: &rusqlite::Row<'_>, start: usize, end: usize) -> rusqlite::Result<Row> {
    (start..end)
        .map(|i| row.get_ref(i).map(from_sql))
        .collect::<rusqlite::Result<Vec<_>>>()
        .map(Row::new)
}

/// Runs a read statement and returns every row at full width.
pub(crate) fn query_rows(conn: &Connection, stmt: &Statement) -> rusqlite::Result<Vec<Row>> {
    debug!(sql = %stmt.sql, params = stmt.params.len(), "query");
    let mut prepared = conn.prepare(&stmt.sql)?;
    let width = prepared.column_count();
    prepared
        .query_map(params_from_iter(stmt.params.iter().map(to_sql)), |row| {
            read_row(row, 0, width)
        })?
        .collect()
}

/// Runs a mutating statement, returning the affected row count.
///
/// Any engine rejection is reported as [`ManagerError::MutationError`].
pub(crate) fn execute_mutation(conn: &Connection, stmt: &Statement) -> Result<usize> {
    debug!(sql = %stmt.sql, params = stmt.params.len(), "execute");
    conn.execute(&stmt.sql, params_from_iter(stmt.params.iter().map(to_sql)))
        .map_err(|e| ManagerError::MutationError(e.to_string()))
}

/// Re-reads every row of `table`, each paired with its primary-key value.
///
/// `columns` must be the table's current metadata.
pub(crate) fn load_rows(conn: &Connection, table: &str, columns: &[ColumnInfo]) -> Result<RowSet> {
    let primary_key = effective_primary_key(columns);
    let stmt = statement::select_keyed(table, &primary_key)?;
    debug!(sql = %stmt.sql, "load rows");

    let mut prepared = conn.prepare(&stmt.sql)?;
    let width = prepared.column_count();
    let rows = prepared
        .query_map([], |row| {
            Ok(KeyedRow {
                key: from_sql(row.get_ref(0)?),
                row: read_row(row, 1, width)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(RowSet {
        table: table.to_string(),
        columns: column_names(columns),
        primary_key,
        rows,
    })
}
