//! Runtime table metadata.
//!
//! [`SchemaInspector`] answers "what does this table look like right now?".
//! Nothing is cached: each call re-reads `pragma_table_info`, so a rename or
//! recreate between two operations is always observed.

use dbkeeper_core::{
    ColumnInfo, PrimaryKey, effective_primary_key, rowid_alias, validate_table_name,
};
use rusqlite::{Connection, OptionalExtension};

use crate::error::{ManagerError, Result};

/// Reads column metadata and table names from a connection.
///
/// # Examples
///
/// ```
/// use dbkeeper_core::PrimaryKey;
/// use dbkeeper_sqlite::SchemaInspector;
/// use rusqlite::Connection;
///
/// let conn = Connection::open_in_memory().unwrap();
/// conn.execute_batch("CREATE TABLE people (id INTEGER PRIMARY KEY, name TEXT)").unwrap();
///
/// let inspector = SchemaInspector::new(&conn);
/// let columns = inspector.columns("people").unwrap();
/// assert_eq!(columns.len(), 2);
/// assert_eq!(inspector.primary_key("people").unwrap(), PrimaryKey::Column("id".into()));
/// assert!(inspector.columns("missing").is_err());
/// ```
pub struct SchemaInspector<'a> {
    conn: &'a Connection,
}

impl<'a> SchemaInspector<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Returns the table's columns in declaration order.
    ///
    /// # Errors
    ///
    /// Returns [`ManagerError::ValidationError`] for an empty or malformed
    /// table name and [`ManagerError::SchemaError`] if the table does not
    /// exist or its metadata cannot be read.
    pub fn columns(&self, table: &str) -> Result<Vec<ColumnInfo>> {
        validate_table_name(table)?;
        let schema_err =
            |e: rusqlite::Error| ManagerError::SchemaError(format!("cannot read columns of '{table}': {e}"));

        let mut stmt = self
            .conn
            .prepare(
                r#"SELECT cid, name, type, "notnull", dflt_value, pk
                   FROM pragma_table_info(?1) ORDER BY cid"#,
            )
            .map_err(schema_err)?;

        let columns = stmt
            .query_map([table], |row| {
                Ok(ColumnInfo {
                    cid: row.get(0)?,
                    name: row.get(1)?,
                    declared_type: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                    not_null: row.get::<_, i64>(3)? != 0,
                    default_value: row.get(4)?,
                    primary_key: row.get::<_, i64>(5)? > 0,
                })
            })
            .map_err(schema_err)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(schema_err)?;

        if columns.is_empty() {
            return Err(ManagerError::SchemaError(format!(
                "table '{table}' does not exist"
            )));
        }
        Ok(columns)
    }

    /// Returns the table's effective primary key.
    ///
    /// The first declared key column wins; tables without one are addressed
    /// through [`PrimaryKey::RowId`].
    pub fn primary_key(&self, table: &str) -> Result<PrimaryKey> {
        Ok(effective_primary_key(&self.columns(table)?))
    }

    /// False for `WITHOUT ROWID` tables.
    pub fn has_rowid(&self, table: &str) -> Result<bool> {
        validate_table_name(table)?;
        let without_rowid: Option<i64> = self
            .conn
            .query_row(
                "SELECT wr FROM pragma_table_list WHERE schema = 'main' AND name = ?1",
                [table],
                |row| row.get(0),
            )
            .optional()?;
        match without_rowid {
            Some(wr) => Ok(wr == 0),
            None => Err(ManagerError::SchemaError(format!(
                "table '{table}' does not exist"
            ))),
        }
    }

    /// Name of the column that aliases the rowid, if the table has one.
    pub fn rowid_alias(&self, table: &str) -> Result<Option<String>> {
        let columns = self.columns(table)?;
        let has_rowid = self.has_rowid(table)?;
        Ok(rowid_alias(&columns, has_rowid).map(|c| c.name.clone()))
    }

    /// Lists user tables, excluding SQLite's internal `sqlite_*` tables.
    pub fn table_names(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(names)
    }

    /// Checks whether a table with this exact name exists.
    pub fn table_exists(&self, table: &str) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [table],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }
}
