//! Type-agnostic row editing against a runtime-discovered schema.

use dbkeeper_core::{
    ColumnInfo, PrimaryKey, RowSet, UndoRecord, ValidationError, Value, effective_primary_key,
    encode,
};
use rusqlite::Connection;
use tracing::info;

use crate::convert::{execute_mutation, load_rows, query_rows};
use crate::error::{ManagerError, Result};
use crate::schema::SchemaInspector;
use crate::statement;
use crate::undo::UndoManager;

/// Insert, update and delete for one named table.
///
/// The editor holds no state of its own: it borrows the connection and the
/// session's [`UndoManager`]. Every operation inspects the table once,
/// executes, records its [`UndoRecord`] and returns the refreshed rows.
///
/// # Examples
///
/// ```
/// use dbkeeper_core::Value;
/// use dbkeeper_sqlite::{TableEditor, UndoManager};
/// use rusqlite::Connection;
///
/// let conn = Connection::open_in_memory().unwrap();
/// conn.execute_batch("CREATE TABLE people (id INTEGER PRIMARY KEY, name TEXT)").unwrap();
/// let mut undo = UndoManager::new();
///
/// let rows = TableEditor::new(&conn, &mut undo, "people")
///     .insert(&["name".to_string()], &[Value::from("Ann")])
///     .unwrap();
/// assert_eq!(rows.len(), 1);
///
/// let rows = undo.undo(&conn).unwrap();
/// assert!(rows.is_empty());
/// ```
pub struct TableEditor<'a> {
    conn: &'a Connection,
    undo: &'a mut UndoManager,
    table: String,
}

impl<'a> TableEditor<'a> {
    pub fn new(conn: &'a Connection, undo: &'a mut UndoManager, table: impl Into<String>) -> Self {
        Self {
            conn,
            undo,
            table: table.into(),
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Current column metadata of the table.
    pub fn columns(&self) -> Result<Vec<ColumnInfo>> {
        SchemaInspector::new(self.conn).columns(&self.table)
    }

    /// All rows of the table, each paired with its key.
    pub fn rows(&self) -> Result<RowSet> {
        let columns = self.columns()?;
        load_rows(self.conn, &self.table, &columns)
    }

    /// Inserts one row with exactly the given columns.
    ///
    /// Omitted columns take their defaults; an empty column list inserts a
    /// row of defaults. Engine rejections, including unknown column names,
    /// surface as [`ManagerError::MutationError`].
    pub fn insert(&mut self, columns: &[String], values: &[Value]) -> Result<RowSet> {
        let schema = self.columns()?;
        let row = encode(columns, values.to_vec())?;
        let stmt = statement::insert(&self.table, columns, row.values())?;
        execute_mutation(self.conn, &stmt)?;

        info!(table = %self.table, columns = columns.len(), "inserted row");
        self.undo.record(UndoRecord::Insert {
            table: self.table.clone(),
            columns: columns.to_vec(),
            values: row.into_values(),
        });
        load_rows(self.conn, &self.table, &schema)
    }

    /// Sets `columns` to `new_values` on the row identified by `key`.
    ///
    /// `old_values` are the row's values before the change, as the caller
    /// last saw them; they are recorded for undo without being re-read.
    ///
    /// # Errors
    ///
    /// [`ManagerError::MutationError`] unless exactly one row matches `key`.
    /// Nothing is written in that case.
    pub fn update(
        &mut self,
        key: &Value,
        columns: &[String],
        new_values: &[Value],
        old_values: &[Value],
    ) -> Result<RowSet> {
        let schema = self.columns()?;
        let primary_key = effective_primary_key(&schema);
        if old_values.len() != columns.len() {
            return Err(ValidationError::LengthMismatch {
                expected: columns.len(),
                actual: old_values.len(),
            }
            .into());
        }
        let stmt = statement::update(&self.table, columns, new_values, &primary_key, key)?;

        let tx = self.conn.unchecked_transaction()?;
        let affected = execute_mutation(&tx, &stmt)?;
        if affected != 1 {
            return Err(ManagerError::MutationError(format!(
                "update of {} where {primary_key} = {key} matched {affected} rows",
                self.table
            )));
        }
        tx.commit()?;

        info!(table = %self.table, %key, "updated row");
        self.undo.record(UndoRecord::Update {
            table: self.table.clone(),
            columns: columns.to_vec(),
            old_values: old_values.to_vec(),
            key: key_after_update(&primary_key, key, columns, new_values),
        });
        load_rows(self.conn, &self.table, &schema)
    }

    /// Deletes the rows identified by `keys`, in order, as one unit.
    ///
    /// Each matching row is read in full before it is deleted. If any key
    /// matches nothing or any delete fails, every delete of the batch is
    /// rolled back. A key repeated in `keys` is deleted once.
    pub fn delete_rows(&mut self, keys: &[Value]) -> Result<RowSet> {
        if keys.is_empty() {
            return Err(ValidationError::EmptyKeySet.into());
        }
        let schema = self.columns()?;
        let primary_key = effective_primary_key(&schema);

        let tx = self.conn.unchecked_transaction()?;
        let mut seen: Vec<&Value> = Vec::with_capacity(keys.len());
        let mut deleted_rows = Vec::new();
        for key in keys {
            if seen.contains(&key) {
                continue;
            }
            seen.push(key);

            let snapshot = query_rows(&tx, &statement::select_by_key(&self.table, &primary_key, key)?)?;
            if snapshot.is_empty() {
                return Err(ManagerError::MutationError(format!(
                    "no row in {} where {primary_key} = {key}",
                    self.table
                )));
            }
            execute_mutation(&tx, &statement::delete_by_key(&self.table, &primary_key, key)?)?;
            deleted_rows.extend(snapshot);
        }
        tx.commit()?;

        info!(table = %self.table, rows = deleted_rows.len(), "deleted rows");
        self.undo.record(UndoRecord::Delete {
            table: self.table.clone(),
            deleted_rows,
        });
        load_rows(self.conn, &self.table, &schema)
    }
}

/// Key under which an updated row can be found afterwards.
fn key_after_update(
    primary_key: &PrimaryKey,
    key: &Value,
    columns: &[String],
    new_values: &[Value],
) -> Value {
    match primary_key {
        PrimaryKey::Column(name) => columns
            .iter()
            .position(|c| c == name)
            .and_then(|i| new_values.get(i))
            .cloned()
            .unwrap_or_else(|| key.clone()),
        PrimaryKey::RowId => key.clone(),
    }
}

#[cfg(test)]
mod tests {
    use dbkeeper_core::Row;

    use super::*;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            r#"
CREATE TABLE people (id INTEGER PRIMARY KEY, name TEXT NOT NULL, city TEXT DEFAULT 'Oslo');
INSERT INTO people (id, name) VALUES (1, 'Ann'), (2, 'Bo'), (3, 'Cy');
"#,
        )
        .unwrap();
        conn
    }

    fn cols(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_insert_applies_defaults() {
        let conn = setup();
        let mut undo = UndoManager::new();
        let rows = TableEditor::new(&conn, &mut undo, "people")
            .insert(&cols(&["name"]), &[Value::from("Di")])
            .unwrap();
        assert_eq!(
            rows.find(&Value::Integer(4)),
            Some(&Row::new(vec![4.into(), "Di".into(), "Oslo".into()]))
        );
        assert!(matches!(undo.pending(), Some(UndoRecord::Insert { .. })));
    }

    #[test]
    fn test_insert_constraint_violation_records_nothing() {
        let conn = setup();
        let mut undo = UndoManager::new();
        let err = TableEditor::new(&conn, &mut undo, "people")
            .insert(&cols(&["city"]), &[Value::from("Rome")])
            .unwrap_err();
        assert!(matches!(err, ManagerError::MutationError(_)));
        assert!(!undo.has_pending());
    }

    #[test]
    fn test_insert_unknown_column_is_mutation_error() {
        let conn = setup();
        let mut undo = UndoManager::new();
        let err = TableEditor::new(&conn, &mut undo, "people")
            .insert(&cols(&["age"]), &[Value::Integer(3)])
            .unwrap_err();
        assert!(matches!(err, ManagerError::MutationError(_)));
    }

    #[test]
    fn test_insert_length_mismatch_is_validation_error() {
        let conn = setup();
        let mut undo = UndoManager::new();
        let err = TableEditor::new(&conn, &mut undo, "people")
            .insert(&cols(&["name", "city"]), &[Value::from("Di")])
            .unwrap_err();
        assert!(matches!(err, ManagerError::ValidationError(_)));
    }

    #[test]
    fn test_update_missing_key_writes_nothing() {
        let conn = setup();
        let mut undo = UndoManager::new();
        let mut editor = TableEditor::new(&conn, &mut undo, "people");
        let err = editor
            .update(
                &Value::Integer(42),
                &cols(&["name"]),
                &[Value::from("X")],
                &[Value::from("Y")],
            )
            .unwrap_err();
        assert!(matches!(err, ManagerError::MutationError(_)));
        assert!(!undo.has_pending());
    }

    #[test]
    fn test_update_matching_several_rows_writes_nothing() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            r#"
CREATE TABLE c (a INTEGER, v TEXT, w TEXT, PRIMARY KEY (a, v));
INSERT INTO c VALUES (1, 'x', 'p'), (1, 'y', 'q');
"#,
        )
        .unwrap();
        let mut undo = UndoManager::new();
        let mut editor = TableEditor::new(&conn, &mut undo, "c");
        let err = editor
            .update(
                &Value::Integer(1),
                &cols(&["w"]),
                &[Value::from("z")],
                &[Value::from("p")],
            )
            .unwrap_err();
        assert!(matches!(err, ManagerError::MutationError(_)));

        let rows = editor.rows().unwrap();
        assert_eq!(
            rows.plain_rows().cloned().collect::<Vec<_>>(),
            vec![
                Row::new(vec![1.into(), "x".into(), "p".into()]),
                Row::new(vec![1.into(), "y".into(), "q".into()]),
            ]
        );
        assert!(!undo.has_pending());
    }

    #[test]
    fn test_update_of_primary_key_records_new_key() {
        let conn = setup();
        let mut undo = UndoManager::new();
        TableEditor::new(&conn, &mut undo, "people")
            .update(
                &Value::Integer(3),
                &cols(&["id"]),
                &[Value::Integer(30)],
                &[Value::Integer(3)],
            )
            .unwrap();
        match undo.pending() {
            Some(UndoRecord::Update { key, .. }) => assert_eq!(key, &Value::Integer(30)),
            other => panic!("unexpected record: {other:?}"),
        }

        let rows = undo.undo(&conn).unwrap();
        assert!(rows.find(&Value::Integer(3)).is_some());
        assert!(rows.find(&Value::Integer(30)).is_none());
    }

    #[test]
    fn test_delete_empty_key_set() {
        let conn = setup();
        let mut undo = UndoManager::new();
        let err = TableEditor::new(&conn, &mut undo, "people")
            .delete_rows(&[])
            .unwrap_err();
        assert!(matches!(
            err,
            ManagerError::ValidationError(ValidationError::EmptyKeySet)
        ));
    }

    #[test]
    fn test_delete_batch_is_atomic() {
        let conn = setup();
        let mut undo = UndoManager::new();
        let err = TableEditor::new(&conn, &mut undo, "people")
            .delete_rows(&[Value::Integer(1), Value::Integer(99)])
            .unwrap_err();
        assert!(matches!(err, ManagerError::MutationError(_)));

        let rows = TableEditor::new(&conn, &mut undo, "people").rows().unwrap();
        assert_eq!(rows.len(), 3);
        assert!(!undo.has_pending());
    }

    #[test]
    fn test_delete_repeated_key_once() {
        let conn = setup();
        let mut undo = UndoManager::new();
        let rows = TableEditor::new(&conn, &mut undo, "people")
            .delete_rows(&[Value::Integer(2), Value::Integer(2)])
            .unwrap();
        assert_eq!(rows.len(), 2);
        match undo.pending() {
            Some(UndoRecord::Delete { deleted_rows, .. }) => assert_eq!(deleted_rows.len(), 1),
            other => panic!("unexpected record: {other:?}"),
        }
    }

    #[test]
    fn test_text_key_matches_integer_column() {
        let conn = setup();
        let mut undo = UndoManager::new();
        let rows = TableEditor::new(&conn, &mut undo, "people")
            .delete_rows(&[Value::from("1")])
            .unwrap();
        assert!(rows.find(&Value::Integer(1)).is_none());
    }

    #[test]
    fn test_missing_table() {
        let conn = setup();
        let mut undo = UndoManager::new();
        let err = TableEditor::new(&conn, &mut undo, "ghosts")
            .insert(&[], &[])
            .unwrap_err();
        assert!(matches!(err, ManagerError::SchemaError(_)));
    }
}
