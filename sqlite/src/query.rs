//! Ad-hoc SQL.
//!
//! Statement text typed by the user is passed to the engine as-is. It is the
//! one place where caller text becomes SQL without identifier validation, so
//! it never feeds the undo slot.

use std::collections::VecDeque;

use dbkeeper_core::{Row, ValidationError};
use rusqlite::Connection;
use tracing::{debug, info};

use crate::convert::read_row;
use crate::error::Result;

/// Result of one ad-hoc statement.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    /// The statement produced a result set.
    Rows { columns: Vec<String>, rows: Vec<Row> },
    /// The statement produced no columns; `affected` is the change count.
    Executed { affected: usize },
}

/// Runs a single statement.
///
/// Statements with result columns (`SELECT`, `PRAGMA ...`, `... RETURNING`)
/// yield [`QueryOutcome::Rows`]; anything else yields
/// [`QueryOutcome::Executed`].
///
/// ```
/// use dbkeeper_sqlite::{QueryOutcome, run_query};
/// use rusqlite::Connection;
///
/// let conn = Connection::open_in_memory().unwrap();
/// run_query(&conn, "CREATE TABLE t (x INTEGER)").unwrap();
/// assert_eq!(
///     run_query(&conn, "INSERT INTO t VALUES (1), (2)").unwrap(),
///     QueryOutcome::Executed { affected: 2 }
/// );
/// match run_query(&conn, "SELECT x FROM t").unwrap() {
///     QueryOutcome::Rows { columns, rows } => {
///         assert_eq!(columns, vec!["x"]);
///         assert_eq!(rows.len(), 2);
///     }
///     other => panic!("{other:?}"),
/// }
/// ```
pub fn run_query(conn: &Connection, sql: &str) -> Result<QueryOutcome> {
    let sql = sql.trim();
    if sql.is_empty() {
        return Err(ValidationError::EmptyStatement.into());
    }
    debug!(%sql, "ad-hoc query");

    let mut stmt = conn.prepare(sql)?;
    let width = stmt.column_count();
    if width == 0 {
        let affected = stmt.execute([])?;
        info!(affected, "executed statement");
        return Ok(QueryOutcome::Executed { affected });
    }

    let columns = stmt
        .column_names()
        .into_iter()
        .map(String::from)
        .collect::<Vec<_>>();
    let rows = stmt
        .query_map([], |row| read_row(row, 0, width))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(QueryOutcome::Rows { columns, rows })
}

/// Runs a multi-statement script.
///
/// Statements execute in order; a failing statement stops the script and
/// earlier statements stay applied unless the script manages its own
/// transaction.
pub fn run_script(conn: &Connection, script: &str) -> Result<()> {
    if script.trim().is_empty() {
        return Err(ValidationError::EmptyStatement.into());
    }
    conn.execute_batch(script)?;
    info!(bytes = script.len(), "executed script");
    Ok(())
}

/// Most recent ad-hoc statements, oldest first, bounded in length.
#[derive(Debug, Clone)]
pub struct QueryHistory {
    entries: VecDeque<String>,
    limit: usize,
}

impl QueryHistory {
    pub fn new(limit: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(limit.min(64)),
            limit,
        }
    }

    /// Appends `sql`, evicting the oldest entry when full.
    pub fn push(&mut self, sql: impl Into<String>) {
        if self.limit == 0 {
            return;
        }
        if self.entries.len() == self.limit {
            self.entries.pop_front();
        }
        self.entries.push_back(sql.into());
    }

    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
