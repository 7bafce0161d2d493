//! Schema-agnostic row editing for SQLite databases.
//!
//! This crate edits tables it knows nothing about ahead of time. Column
//! lists and the primary key are read from the engine at the start of every
//! operation, identifiers are checked against an allow-list and quoted, and
//! values are always bound as parameters.
//!
//! # Architecture
//!
//! - **`schema`**: [`SchemaInspector`], column metadata and table names
//! - **`statement`**: SQL builders for keyed inserts, updates and deletes
//! - **`editor`**: [`TableEditor`], insert/update/delete with undo records
//! - **`undo`**: [`UndoManager`], a single undo slot and inverse planning
//! - **`catalog`**: create, drop, rename and count tables
//! - **`query`**: ad-hoc statements, scripts and the query history
//! - **`session`**: [`Session`], one open database plus its undo slot,
//!   history and activity log
//!
//! # Quick start
//!
//! ```
//! use dbkeeper_core::Value;
//! use dbkeeper_sqlite::Session;
//!
//! let mut session = Session::open_in_memory().unwrap();
//! session
//!     .run_script("CREATE TABLE people (id INTEGER PRIMARY KEY, name TEXT)")
//!     .unwrap();
//!
//! session.insert("people", &["name".into()], &[Value::from("Bo")]).unwrap();
//! let rows = session
//!     .update(
//!         "people",
//!         &Value::Integer(1),
//!         &["name".into()],
//!         &[Value::from("Robert")],
//!         &[Value::from("Bo")],
//!     )
//!     .unwrap();
//! assert_eq!(rows.find(&Value::Integer(1)).unwrap().get(1), Some(&Value::from("Robert")));
//!
//! let rows = session.undo().unwrap();
//! assert_eq!(rows.find(&Value::Integer(1)).unwrap().get(1), Some(&Value::from("Bo")));
//! ```
//!
//! # Undo
//!
//! Only the last insert, update or delete can be undone, once. Catalog
//! changes and ad-hoc SQL are not undoable; dropping or renaming the table a
//! pending undo refers to discards it.

mod activity;
mod catalog;
mod convert;
mod editor;
mod error;
mod query;
mod schema;
mod session;
mod statement;
mod undo;

pub use activity::{ActivityEntry, ActivityLog};
pub use catalog::{ColumnDef, create_table, drop_all_tables, drop_table, rename_table, row_count};
pub use editor::TableEditor;
pub use error::{ManagerError, Result};
pub use query::{QueryHistory, QueryOutcome, run_query, run_script};
pub use schema::SchemaInspector;
pub use session::{DatabaseSummary, Session};
pub use statement::Statement;
pub use undo::{InverseStep, UndoManager, plan_inverse};
