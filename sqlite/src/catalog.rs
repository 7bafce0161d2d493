//! Table-level operations: create, drop, rename, count.

use std::fmt;

use dbkeeper_core::{
    ValidationError, quote_identifier, validate_definition_text, validate_identifier,
    validate_table_name,
};
use rusqlite::Connection;
use tracing::{debug, info};

use crate::error::{ManagerError, Result};
use crate::schema::SchemaInspector;

/// One column of a `CREATE TABLE` statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    pub declared_type: String,
    pub constraints: String,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, declared_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declared_type: declared_type.into(),
            constraints: String::new(),
        }
    }

    pub fn with_constraints(mut self, constraints: impl Into<String>) -> Self {
        self.constraints = constraints.into();
        self
    }

    /// Parses `name [TYPE [constraints...]]`.
    ///
    /// ```
    /// use dbkeeper_sqlite::ColumnDef;
    ///
    /// let def = ColumnDef::parse("id INTEGER PRIMARY KEY").unwrap();
    /// assert_eq!(def.name, "id");
    /// assert_eq!(def.declared_type, "INTEGER");
    /// assert_eq!(def.constraints, "PRIMARY KEY");
    /// ```
    pub fn parse(text: &str) -> std::result::Result<Self, ValidationError> {
        let mut parts = text.split_whitespace();
        let name = parts
            .next()
            .ok_or_else(|| ValidationError::InvalidColumnDefinition(text.to_string()))?;
        let declared_type = parts.next().unwrap_or_default();
        let constraints = parts.collect::<Vec<_>>().join(" ");
        let def = ColumnDef::new(name, declared_type).with_constraints(constraints);
        def.validate()?;
        Ok(def)
    }

    fn validate(&self) -> std::result::Result<(), ValidationError> {
        validate_identifier(&self.name)?;
        validate_definition_text(&self.declared_type)?;
        validate_definition_text(&self.constraints)
    }
}

impl fmt::Display for ColumnDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&quote_identifier(&self.name))?;
        for part in [&self.declared_type, &self.constraints] {
            if !part.is_empty() {
                write!(f, " {part}")?;
            }
        }
        Ok(())
    }
}

fn ensure_exists(conn: &Connection, table: &str) -> Result<()> {
    validate_table_name(table)?;
    if !SchemaInspector::new(conn).table_exists(table)? {
        return Err(ManagerError::SchemaError(format!(
            "table '{table}' does not exist"
        )));
    }
    Ok(())
}

/// Creates `table` with the given columns.
pub fn create_table(conn: &Connection, table: &str, columns: &[ColumnDef]) -> Result<()> {
    validate_table_name(table)?;
    if columns.is_empty() {
        return Err(ValidationError::EmptyColumnList.into());
    }
    for column in columns {
        column.validate()?;
    }

    let body = columns
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!("CREATE TABLE {} ({body})", quote_identifier(table));
    debug!(%sql, "create table");
    conn.execute(&sql, [])?;
    info!(table, columns = columns.len(), "created table");
    Ok(())
}

pub fn drop_table(conn: &Connection, table: &str) -> Result<()> {
    ensure_exists(conn, table)?;
    conn.execute(&format!("DROP TABLE {}", quote_identifier(table)), [])?;
    info!(table, "dropped table");
    Ok(())
}

pub fn rename_table(conn: &Connection, old: &str, new: &str) -> Result<()> {
    ensure_exists(conn, old)?;
    validate_table_name(new)?;
    conn.execute(
        &format!(
            "ALTER TABLE {} RENAME TO {}",
            quote_identifier(old),
            quote_identifier(new)
        ),
        [],
    )?;
    info!(old, new, "renamed table");
    Ok(())
}

/// Drops every user table in one transaction, returning their names.
pub fn drop_all_tables(conn: &Connection) -> Result<Vec<String>> {
    let tables = SchemaInspector::new(conn).table_names()?;
    let tx = conn.unchecked_transaction()?;
    for table in &tables {
        tx.execute(&format!("DROP TABLE {}", quote_identifier(table)), [])?;
    }
    tx.commit()?;
    info!(count = tables.len(), "dropped all tables");
    Ok(tables)
}

pub fn row_count(conn: &Connection, table: &str) -> Result<u64> {
    ensure_exists(conn, table)?;
    let count: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM {}", quote_identifier(table)),
        [],
        |row| row.get(0),
    )?;
    Ok(count.unsigned_abs())
}
