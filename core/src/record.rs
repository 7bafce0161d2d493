//! Descriptions of completed row mutations.
//!
//! An [`UndoRecord`] carries exactly what is needed to compute the inverse
//! of one insert, update or delete. Records live only in memory and are
//! never persisted across sessions.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::{Row, Value};

/// The last successful mutation of a table.
///
/// Inverse semantics, applied by the undo manager:
///
/// - [`Insert`](UndoRecord::Insert) deletes the row holding the greatest
///   primary-key value currently in the table. This is the inserted row only
///   while keys grow monotonically.
/// - [`Update`](UndoRecord::Update) writes `old_values` back to `columns`
///   of the row identified by `key`. The old values come from the caller;
///   stale values are written back as-is.
/// - [`Delete`](UndoRecord::Delete) re-inserts each snapshot as a
///   full-width positional row. A table without a declared key gets fresh
///   rowids for the restored rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum UndoRecord {
    Insert {
        table: String,
        columns: Vec<String>,
        values: Vec<Value>,
    },
    Update {
        table: String,
        columns: Vec<String>,
        old_values: Vec<Value>,
        key: Value,
    },
    Delete {
        table: String,
        deleted_rows: Vec<Row>,
    },
}

impl UndoRecord {
    /// Table the mutation was applied to.
    pub fn table(&self) -> &str {
        match self {
            UndoRecord::Insert { table, .. }
            | UndoRecord::Update { table, .. }
            | UndoRecord::Delete { table, .. } => table,
        }
    }

    /// Short operation name: `insert`, `update` or `delete`.
    pub fn action(&self) -> &'static str {
        match self {
            UndoRecord::Insert { .. } => "insert",
            UndoRecord::Update { .. } => "update",
            UndoRecord::Delete { .. } => "delete",
        }
    }

    /// Number of rows the mutation touched.
    pub fn row_count(&self) -> usize {
        match self {
            UndoRecord::Insert { .. } | UndoRecord::Update { .. } => 1,
            UndoRecord::Delete { deleted_rows, .. } => deleted_rows.len(),
        }
    }
}

impl fmt::Display for UndoRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UndoRecord::Insert { table, .. } => write!(f, "insert into {table}"),
            UndoRecord::Update { table, key, .. } => write!(f, "update of {table} row {key}"),
            UndoRecord::Delete {
                table,
                deleted_rows,
            } => write!(f, "delete of {} row(s) from {table}", deleted_rows.len()),
        }
    }
}
