//! One-level undo.
//!
//! [`UndoManager`] owns a single [`UndoRecord`] slot. Recording overwrites
//! whatever was there; undoing empties it. There is no redo and no history.
//!
//! The inverse of a record is planned by [`plan_inverse`], a pure function of
//! the record and the table's current primary key, and then applied inside a
//! transaction. Known limits of the inverses:
//!
//! - Deleting from a table without a declared key and then undoing gives the
//!   restored rows fresh rowids.
//! - Update undo writes back whatever old values the caller supplied, even if
//!   they were stale.
//! - Insert undo removes the row with the greatest key, which is the inserted
//!   row only while keys grow monotonically.

use dbkeeper_core::{PrimaryKey, RowSet, UndoRecord, ValidationError, effective_primary_key};
use rusqlite::Connection;
use tracing::{debug, info, warn};

use crate::convert::{execute_mutation, load_rows};
use crate::error::{ManagerError, Result};
use crate::schema::SchemaInspector;
use crate::statement::{self, Statement};

/// One statement of an inverse, with the row count it must affect.
#[derive(Debug, Clone, PartialEq)]
pub struct InverseStep {
    pub statement: Statement,
    /// `None` accepts any count.
    pub expected_rows: Option<usize>,
}

/// Builds the statements that reverse `record` on a table keyed by
/// `primary_key`.
pub fn plan_inverse(
    record: &UndoRecord,
    primary_key: &PrimaryKey,
) -> std::result::Result<Vec<InverseStep>, ValidationError> {
    match record {
        UndoRecord::Insert { table, .. } => Ok(vec![InverseStep {
            statement: statement::delete_greatest_key(table, primary_key)?,
            expected_rows: None,
        }]),
        UndoRecord::Update {
            table,
            columns,
            old_values,
            key,
        } => Ok(vec![InverseStep {
            statement: statement::update(table, columns, old_values, primary_key, key)?,
            expected_rows: Some(1),
        }]),
        UndoRecord::Delete {
            table,
            deleted_rows,
        } => deleted_rows
            .iter()
            .map(|row| {
                statement::insert_positional(table, row).map(|statement| InverseStep {
                    statement,
                    expected_rows: Some(1),
                })
            })
            .collect(),
    }
}

/// Holds at most one pending [`UndoRecord`].
///
/// # Examples
///
/// ```
/// use dbkeeper_core::{UndoRecord, Value};
/// use dbkeeper_sqlite::{ManagerError, UndoManager};
/// use rusqlite::Connection;
///
/// let conn = Connection::open_in_memory().unwrap();
/// conn.execute_batch("CREATE TABLE t (id INTEGER PRIMARY KEY, v TEXT); INSERT INTO t (v) VALUES ('a');")
///     .unwrap();
///
/// let mut undo = UndoManager::new();
/// assert!(matches!(undo.undo(&conn), Err(ManagerError::NoPendingOperationError)));
///
/// undo.record(UndoRecord::Insert {
///     table: "t".into(),
///     columns: vec!["v".into()],
///     values: vec![Value::from("a")],
/// });
/// assert!(undo.has_pending());
///
/// let rows = undo.undo(&conn).unwrap();
/// assert!(rows.is_empty());
/// assert!(!undo.has_pending());
/// ```
#[derive(Debug, Default)]
pub struct UndoManager {
    pending: Option<UndoRecord>,
}

impl UndoManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `record`, discarding any previous one.
    pub fn record(&mut self, record: UndoRecord) {
        if let Some(previous) = self.pending.replace(record) {
            debug!(discarded = %previous, "undo slot overwritten");
        }
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn pending(&self) -> Option<&UndoRecord> {
        self.pending.as_ref()
    }

    /// Empties the slot without applying anything.
    pub fn clear(&mut self) -> Option<UndoRecord> {
        self.pending.take()
    }

    /// Applies the inverse of the pending record and returns the refreshed
    /// rows of its table.
    ///
    /// # Errors
    ///
    /// - [`ManagerError::NoPendingOperationError`] if the slot is empty; the
    ///   database is not touched.
    /// - [`ManagerError::SchemaError`] if the table no longer exists.
    /// - [`ManagerError::MutationError`] if the engine rejects an inverse
    ///   statement or an update inverse does not match exactly one row.
    ///
    /// On any failure the transaction is rolled back and the record stays
    /// pending.
    pub fn undo(&mut self, conn: &Connection) -> Result<RowSet> {
        let record = self
            .pending
            .take()
            .ok_or(ManagerError::NoPendingOperationError)?;

        match apply_inverse(conn, &record) {
            Ok(rows) => {
                info!(operation = %record, "undone");
                Ok(rows)
            }
            Err(err) => {
                self.pending = Some(record);
                Err(err)
            }
        }
    }
}

fn apply_inverse(conn: &Connection, record: &UndoRecord) -> Result<RowSet> {
    let table = record.table();
    let columns = SchemaInspector::new(conn).columns(table)?;
    let primary_key = effective_primary_key(&columns);
    let steps = plan_inverse(record, &primary_key)?;

    let tx = conn.unchecked_transaction()?;
    for step in &steps {
        let affected = execute_mutation(&tx, &step.statement)?;
        match step.expected_rows {
            Some(expected) if affected != expected => {
                return Err(ManagerError::MutationError(format!(
                    "undo of {record} affected {affected} row(s), expected {expected}"
                )));
            }
            None if affected == 0 => {
                warn!(table, "insert undo found no row to remove");
            }
            _ => {}
        }
    }
    tx.commit()?;

    load_rows(conn, table, &columns)
}
