//! Statement construction for runtime-discovered tables.
//!
//! Identifiers are validated against the allow-list and double-quoted before
//! they are placed in statement text; the `rowid` sentinel is emitted bare.
//! Values are never interpolated: every builder returns them separately in
//! [`Statement::params`], bound positionally by the executor.

use dbkeeper_core::{
    PrimaryKey, Row, ValidationError, Value, quote_identifier, validate_identifier,
    validate_table_name,
};

/// Statement text plus its positional parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

impl Statement {
    fn new(sql: String, params: Vec<Value>) -> Self {
        Self { sql, params }
    }
}

fn table_ident(table: &str) -> Result<String, ValidationError> {
    validate_table_name(table)?;
    Ok(quote_identifier(table))
}

fn column_ident(column: &str) -> Result<String, ValidationError> {
    validate_identifier(column)?;
    Ok(quote_identifier(column))
}

pub(crate) fn key_ident(primary_key: &PrimaryKey) -> Result<String, ValidationError> {
    match primary_key {
        PrimaryKey::Column(name) => column_ident(name),
        PrimaryKey::RowId => Ok(dbkeeper_core::ROWID.to_string()),
    }
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

/// `INSERT INTO t (c1, ...) VALUES (?, ...)`, or `DEFAULT VALUES` when no
/// columns are given.
pub fn insert(table: &str, columns: &[String], values: &[Value]) -> Result<Statement, ValidationError> {
    let table = table_ident(table)?;
    if columns.len() != values.len() {
        return Err(ValidationError::LengthMismatch {
            expected: columns.len(),
            actual: values.len(),
        });
    }
    if columns.is_empty() {
        return Ok(Statement::new(
            format!("INSERT INTO {table} DEFAULT VALUES"),
            Vec::new(),
        ));
    }
    let names = columns
        .iter()
        .map(|c| column_ident(c))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Statement::new(
        format!(
            "INSERT INTO {table} ({}) VALUES ({})",
            names.join(", "),
            placeholders(values.len())
        ),
        values.to_vec(),
    ))
}

/// `INSERT INTO t VALUES (?, ...)` with one placeholder per row value.
pub fn insert_positional(table: &str, row: &Row) -> Result<Statement, ValidationError> {
    let table = table_ident(table)?;
    Ok(Statement::new(
        format!("INSERT INTO {table} VALUES ({})", placeholders(row.len())),
        row.values().to_vec(),
    ))
}

/// `UPDATE t SET c1 = ?, ... WHERE <pk> = ?`.
pub fn update(
    table: &str,
    columns: &[String],
    values: &[Value],
    primary_key: &PrimaryKey,
    key: &Value,
) -> Result<Statement, ValidationError> {
    let table = table_ident(table)?;
    if columns.is_empty() {
        return Err(ValidationError::EmptyColumnList);
    }
    if columns.len() != values.len() {
        return Err(ValidationError::LengthMismatch {
            expected: columns.len(),
            actual: values.len(),
        });
    }
    let assignments = columns
        .iter()
        .map(|c| column_ident(c).map(|ident| format!("{ident} = ?")))
        .collect::<Result<Vec<_>, _>>()?;
    let mut params = values.to_vec();
    params.push(key.clone());
    Ok(Statement::new(
        format!(
            "UPDATE {table} SET {} WHERE {} = ?",
            assignments.join(", "),
            key_ident(primary_key)?
        ),
        params,
    ))
}

/// `DELETE FROM t WHERE <pk> = ?`.
pub fn delete_by_key(table: &str, primary_key: &PrimaryKey, key: &Value) -> Result<Statement, ValidationError> {
    let table = table_ident(table)?;
    Ok(Statement::new(
        format!("DELETE FROM {table} WHERE {} = ?", key_ident(primary_key)?),
        vec![key.clone()],
    ))
}

/// Deletes the single row holding the greatest key value.
pub fn delete_greatest_key(table: &str, primary_key: &PrimaryKey) -> Result<Statement, ValidationError> {
    let table = table_ident(table)?;
    let key = key_ident(primary_key)?;
    Ok(Statement::new(
        format!(
            "DELETE FROM {table} WHERE {key} = (SELECT {key} FROM {table} ORDER BY {key} DESC LIMIT 1)"
        ),
        Vec::new(),
    ))
}

/// `SELECT * FROM t WHERE <pk> = ?`: full-width snapshot of one keyed row.
pub fn select_by_key(table: &str, primary_key: &PrimaryKey, key: &Value) -> Result<Statement, ValidationError> {
    let table = table_ident(table)?;
    Ok(Statement::new(
        format!("SELECT * FROM {table} WHERE {} = ?", key_ident(primary_key)?),
        vec![key.clone()],
    ))
}

/// `SELECT <pk>, * FROM t`: every row prefixed with its key.
pub fn select_keyed(table: &str, primary_key: &PrimaryKey) -> Result<Statement, ValidationError> {
    let table = table_ident(table)?;
    Ok(Statement::new(
        format!("SELECT {}, * FROM {table}", key_ident(primary_key)?),
        Vec::new(),
    ))
}
