//! One open database and everything that lives as long as it is open.
//!
//! A [`Session`] owns the connection, the undo slot, the ad-hoc query
//! history and the activity log. Row edits go through [`TableEditor`];
//! everything else (catalog changes, imports, exports, backups) is a thin
//! wrapper that also writes an activity message.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use dbkeeper_core::{
    Affinity, ColumnInfo, Row, RowMap, RowSet, UndoRecord, ValidationError, Value, decode,
    effective_primary_key,
};
use dbkeeper_transfer::{
    DEFAULT_HISTORY_LIMIT, ManagerConfig, read_csv, read_json_records, render_database_schema,
    write_csv,
};
use rusqlite::{Connection, OpenFlags};
use tracing::info;

use crate::activity::ActivityLog;
use crate::catalog::{self, ColumnDef};
use crate::convert::{execute_mutation, load_rows, query_rows};
use crate::editor::TableEditor;
use crate::error::{ManagerError, Result};
use crate::query::{self, QueryHistory, QueryOutcome};
use crate::schema::SchemaInspector;
use crate::statement;
use crate::undo::UndoManager;

const DEFAULT_SAMPLE_TEXT: &str = "Sample";

/// Path, size and table count of the open database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseSummary {
    /// `None` for in-memory databases.
    pub path: Option<PathBuf>,
    pub size_bytes: Option<u64>,
    pub table_count: usize,
}

impl fmt::Display for DatabaseSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(path) => writeln!(f, "Database: {}", path.display())?,
            None => writeln!(f, "Database: (in memory)")?,
        }
        if let Some(size) = self.size_bytes {
            writeln!(f, "Size: {size} bytes")?;
        }
        write!(f, "Tables: {}", self.table_count)
    }
}

/// An open database with its undo slot, query history and activity log.
///
/// # Examples
///
/// ```
/// use dbkeeper_core::Value;
/// use dbkeeper_sqlite::{ColumnDef, Session};
///
/// let mut session = Session::open_in_memory().unwrap();
/// session
///     .create_table("people", &[
///         ColumnDef::new("id", "INTEGER").with_constraints("PRIMARY KEY"),
///         ColumnDef::new("name", "TEXT"),
///     ])
///     .unwrap();
///
/// session.insert("people", &["name".into()], &[Value::from("Ann")]).unwrap();
/// assert_eq!(session.row_count("people").unwrap(), 1);
///
/// session.undo().unwrap();
/// assert_eq!(session.row_count("people").unwrap(), 0);
/// ```
pub struct Session {
    conn: Connection,
    path: Option<PathBuf>,
    undo: UndoManager,
    history: QueryHistory,
    activity: ActivityLog,
    sample_text: String,
}

impl Session {
    fn from_connection(conn: Connection, path: Option<PathBuf>) -> Self {
        Self {
            conn,
            path,
            undo: UndoManager::new(),
            history: QueryHistory::new(DEFAULT_HISTORY_LIMIT),
            activity: ActivityLog::new(),
            sample_text: DEFAULT_SAMPLE_TEXT.to_string(),
        }
    }

    /// Creates a new, empty database file.
    ///
    /// # Errors
    ///
    /// Returns [`ManagerError::AlreadyExists`] if anything exists at `path`.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            return Err(ManagerError::AlreadyExists(path.to_path_buf()));
        }
        let conn = Connection::open(path)?;
        let mut session = Self::from_connection(conn, Some(path.to_path_buf()));
        session
            .activity
            .record(format!("Created database {}", path.display()));
        Ok(session)
    }

    /// Opens an existing database file. A missing file is an error.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        let mut session = Self::from_connection(conn, Some(path.to_path_buf()));
        session
            .activity
            .record(format!("Opened database {}", path.display()));
        Ok(session)
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::from_connection(Connection::open_in_memory()?, None))
    }

    /// Applies the history limit and sample text from `config`.
    pub fn apply_config(&mut self, config: &ManagerConfig) {
        self.history = QueryHistory::new(config.history_limit);
        self.sample_text = config.sample_text.clone();
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn activity(&self) -> &ActivityLog {
        &self.activity
    }

    pub fn history(&self) -> &QueryHistory {
        &self.history
    }

    // Rows and undo

    /// An editor for `table` bound to this session's undo slot.
    pub fn editor(&mut self, table: &str) -> TableEditor<'_> {
        TableEditor::new(&self.conn, &mut self.undo, table)
    }

    pub fn rows(&self, table: &str) -> Result<RowSet> {
        let columns = SchemaInspector::new(&self.conn).columns(table)?;
        load_rows(&self.conn, table, &columns)
    }

    /// Column-name/value view of the row identified by `key`.
    pub fn row_details(&self, table: &str, key: &Value) -> Result<Option<RowMap>> {
        let columns = SchemaInspector::new(&self.conn).columns(table)?;
        let primary_key = effective_primary_key(&columns);
        let stmt = statement::select_by_key(table, &primary_key, key)?;
        match query_rows(&self.conn, &stmt)?.first() {
            Some(row) => Ok(Some(decode(row, &columns)?)),
            None => Ok(None),
        }
    }

    pub fn insert(&mut self, table: &str, columns: &[String], values: &[Value]) -> Result<RowSet> {
        let rows = self.editor(table).insert(columns, values)?;
        self.activity.record(format!("Inserted row into {table}"));
        Ok(rows)
    }

    pub fn update(
        &mut self,
        table: &str,
        key: &Value,
        columns: &[String],
        new_values: &[Value],
        old_values: &[Value],
    ) -> Result<RowSet> {
        let rows = self
            .editor(table)
            .update(key, columns, new_values, old_values)?;
        self.activity
            .record(format!("Updated row {key} in {table}"));
        Ok(rows)
    }

    pub fn delete_rows(&mut self, table: &str, keys: &[Value]) -> Result<RowSet> {
        let rows = self.editor(table).delete_rows(keys)?;
        let deleted = self.undo.pending().map_or(0, UndoRecord::row_count);
        self.activity
            .record(format!("Deleted {deleted} row(s) from {table}"));
        Ok(rows)
    }

    /// Reverses the last insert, update or delete.
    pub fn undo(&mut self) -> Result<RowSet> {
        let description = self.undo.pending().map(ToString::to_string);
        let rows = self.undo.undo(&self.conn)?;
        if let Some(description) = description {
            self.activity.record(format!("Undid {description}"));
        }
        Ok(rows)
    }

    pub fn has_pending_undo(&self) -> bool {
        self.undo.has_pending()
    }

    pub fn pending_undo(&self) -> Option<&UndoRecord> {
        self.undo.pending()
    }

    fn forget_undo_for(&mut self, table: &str) {
        if self.undo.pending().is_some_and(|r| r.table() == table) {
            self.undo.clear();
        }
    }

    // Catalog

    pub fn tables(&self) -> Result<Vec<String>> {
        SchemaInspector::new(&self.conn).table_names()
    }

    pub fn describe(&self, table: &str) -> Result<Vec<ColumnInfo>> {
        SchemaInspector::new(&self.conn).columns(table)
    }

    pub fn row_count(&self, table: &str) -> Result<u64> {
        catalog::row_count(&self.conn, table)
    }

    pub fn create_table(&mut self, table: &str, columns: &[ColumnDef]) -> Result<()> {
        catalog::create_table(&self.conn, table, columns)?;
        self.activity.record(format!("Created table {table}"));
        Ok(())
    }

    /// Drops `table`. A pending undo for that table is discarded.
    pub fn drop_table(&mut self, table: &str) -> Result<()> {
        catalog::drop_table(&self.conn, table)?;
        self.forget_undo_for(table);
        self.activity.record(format!("Dropped table {table}"));
        Ok(())
    }

    /// Renames `old` to `new`. A pending undo for `old` is discarded.
    pub fn rename_table(&mut self, old: &str, new: &str) -> Result<()> {
        catalog::rename_table(&self.conn, old, new)?;
        self.forget_undo_for(old);
        self.activity
            .record(format!("Renamed table {old} to {new}"));
        Ok(())
    }

    pub fn drop_all_tables(&mut self) -> Result<Vec<String>> {
        let dropped = catalog::drop_all_tables(&self.conn)?;
        self.undo.clear();
        self.activity
            .record(format!("Dropped {} table(s)", dropped.len()));
        Ok(dropped)
    }

    pub fn summary(&self) -> Result<DatabaseSummary> {
        let size_bytes = match &self.path {
            Some(path) => Some(fs::metadata(path)?.len()),
            None => None,
        };
        Ok(DatabaseSummary {
            path: self.path.clone(),
            size_bytes,
            table_count: self.tables()?.len(),
        })
    }

    /// Writes a consistent copy of the database to `dest`.
    pub fn backup(&mut self, dest: impl AsRef<Path>) -> Result<()> {
        let dest = dest.as_ref();
        if dest.exists() {
            return Err(ManagerError::AlreadyExists(dest.to_path_buf()));
        }
        self.conn
            .execute("VACUUM INTO ?1", [dest.to_string_lossy()])?;
        self.activity
            .record(format!("Backed up database to {}", dest.display()));
        Ok(())
    }

    // Ad-hoc SQL

    /// Runs one statement and remembers it in the query history.
    ///
    /// Ad-hoc statements are not undoable and leave the undo slot as is.
    pub fn run_query(&mut self, sql: &str) -> Result<QueryOutcome> {
        let trimmed = sql.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyStatement.into());
        }
        self.history.push(trimmed);
        let outcome = query::run_query(&self.conn, trimmed)?;
        match &outcome {
            QueryOutcome::Rows { rows, .. } => self
                .activity
                .record(format!("Query returned {} row(s)", rows.len())),
            QueryOutcome::Executed { affected } => self
                .activity
                .record(format!("Query executed, {affected} row(s) affected")),
        }
        Ok(outcome)
    }

    pub fn run_script(&mut self, script: &str) -> Result<()> {
        query::run_script(&self.conn, script)?;
        self.activity.record("Executed SQL script");
        Ok(())
    }

    pub fn run_script_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let script = fs::read_to_string(path)?;
        query::run_script(&self.conn, &script)?;
        self.activity
            .record(format!("Executed SQL script {}", path.display()));
        Ok(())
    }

    // Import and export

    /// Inserts every CSV record after the header, positionally, as text.
    ///
    /// All records are inserted in one transaction; returns the count.
    pub fn import_csv(&mut self, table: &str, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        SchemaInspector::new(&self.conn).columns(table)?;
        let csv = read_csv(path)?;

        let tx = self.conn.unchecked_transaction()?;
        for record in &csv.records {
            let row: Row = record
                .iter()
                .map(|field| Value::Text(field.clone()))
                .collect::<Vec<_>>()
                .into();
            execute_mutation(&tx, &statement::insert_positional(table, &row)?)?;
        }
        tx.commit()?;

        let count = csv.records.len();
        info!(table, count, path = %path.display(), "imported CSV");
        self.activity
            .record(format!("Imported {count} row(s) into {table} from CSV"));
        Ok(count)
    }

    /// Inserts each object of a JSON array, using its keys as columns.
    pub fn import_json(&mut self, table: &str, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        SchemaInspector::new(&self.conn).columns(table)?;
        let records = read_json_records(path)?;

        let tx = self.conn.unchecked_transaction()?;
        for record in &records {
            let columns = record.keys().cloned().collect::<Vec<_>>();
            let values = record.values().cloned().collect::<Vec<_>>();
            execute_mutation(&tx, &statement::insert(table, &columns, &values)?)?;
        }
        tx.commit()?;

        let count = records.len();
        info!(table, count, path = %path.display(), "imported JSON");
        self.activity
            .record(format!("Imported {count} row(s) into {table} from JSON"));
        Ok(count)
    }

    /// Writes `table` to a CSV file; returns the number of rows written.
    pub fn export_csv(&mut self, table: &str, path: impl AsRef<Path>) -> Result<usize> {
        let path = path.as_ref();
        let rows = self.rows(table)?;
        let count = write_csv(path, &rows.columns, rows.plain_rows())?;
        self.activity
            .record(format!("Exported {count} row(s) from {table} to {}", path.display()));
        Ok(count)
    }

    /// The schema text of every table.
    pub fn schema_text(&self) -> Result<String> {
        let inspector = SchemaInspector::new(&self.conn);
        let tables = inspector
            .table_names()?
            .into_iter()
            .map(|t| inspector.columns(&t).map(|c| (t, c)))
            .collect::<Result<Vec<_>>>()?;
        Ok(render_database_schema(
            tables.iter().map(|(t, c)| (t.as_str(), c.as_slice())),
        ))
    }

    /// Writes [`schema_text`](Self::schema_text) to `path`.
    pub fn export_schema(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, self.schema_text()?)?;
        self.activity
            .record(format!("Exported schema to {}", path.display()));
        Ok(())
    }

    // Sample data

    /// Inserts one generated row into `table`. The insert is undoable.
    ///
    /// A column aliasing the rowid is left to the engine. Integer and
    /// numeric columns get the next row number, real columns the same as a
    /// float, text columns the configured sample text followed by that
    /// number, and blob or untyped columns the sample text's bytes.
    pub fn generate_sample(&mut self, table: &str) -> Result<RowSet> {
        let inspector = SchemaInspector::new(&self.conn);
        let columns = inspector.columns(table)?;
        let alias = inspector.rowid_alias(table)?;
        let n = catalog::row_count(&self.conn, table)? + 1;
        let n = i64::try_from(n).unwrap_or(i64::MAX);

        let (names, values): (Vec<String>, Vec<Value>) = columns
            .iter()
            .filter(|c| alias.as_deref() != Some(c.name.as_str()))
            .map(|c| (c.name.clone(), self.sample_value(c.affinity(), n)))
            .unzip();

        let rows = self.editor(table).insert(&names, &values)?;
        self.activity
            .record(format!("Generated sample row in {table}"));
        Ok(rows)
    }

    fn sample_value(&self, affinity: Affinity, n: i64) -> Value {
        match affinity {
            Affinity::Integer | Affinity::Numeric => Value::Integer(n),
            Affinity::Real => Value::Real(n as f64),
            Affinity::Text => Value::Text(format!("{} {n}", self.sample_text)),
            Affinity::Blob => Value::Blob(self.sample_text.as_bytes().to_vec()),
        }
    }
}
