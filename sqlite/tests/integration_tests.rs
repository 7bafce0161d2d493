//! Integration tests for the dbkeeper-sqlite crate.

use dbkeeper_core::{Row, RowSet, UndoRecord, Value};
use dbkeeper_sqlite::{ColumnDef, ManagerError, QueryOutcome, Session, TableEditor, UndoManager};
use rusqlite::Connection;
use serde_json::json;
use tempfile::TempDir;

fn cols(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

/// A `people(id INTEGER PRIMARY KEY, name TEXT)` session.
fn people_session() -> Session {
    let mut session = Session::open_in_memory().unwrap();
    session
        .create_table(
            "people",
            &[
                ColumnDef::new("id", "INTEGER").with_constraints("PRIMARY KEY"),
                ColumnDef::new("name", "TEXT"),
            ],
        )
        .unwrap();
    session
}

/// Plain `(key, row)` pairs for whole-table comparisons.
fn snapshot(rows: &RowSet) -> Vec<(Value, Row)> {
    rows.rows
        .iter()
        .map(|r| (r.key.clone(), r.row.clone()))
        .collect()
}

fn seeded_connection() -> Connection {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(
        r#"
CREATE TABLE items (sku TEXT PRIMARY KEY, qty INTEGER NOT NULL, price REAL);
INSERT INTO items VALUES ('a-1', 3, 1.5), ('b-2', 0, NULL), ('c-3', 7, 9.25);
CREATE TABLE notes (body TEXT, stamp INTEGER);
INSERT INTO notes VALUES ('first', 1), ('second', 2), ('third', 3);
"#,
    )
    .unwrap();
    conn
}

// =============================================================================
// Example trace
// =============================================================================

#[test]
fn test_people_trace() {
    let mut session = people_session();

    let rows = session
        .insert("people", &cols(&["name"]), &[Value::from("Ann")])
        .unwrap();
    assert_eq!(
        rows.find(&Value::Integer(1)),
        Some(&Row::new(vec![1.into(), "Ann".into()]))
    );

    let rows = session.undo().unwrap();
    assert!(rows.is_empty());

    session
        .insert("people", &cols(&["name"]), &[Value::from("Bo")])
        .unwrap();
    let rows = session
        .update(
            "people",
            &Value::Integer(1),
            &cols(&["name"]),
            &[Value::from("Robert")],
            &[Value::from("Bo")],
        )
        .unwrap();
    assert_eq!(
        rows.find(&Value::Integer(1)),
        Some(&Row::new(vec![1.into(), "Robert".into()]))
    );

    let rows = session.undo().unwrap();
    assert_eq!(
        snapshot(&rows),
        vec![(Value::Integer(1), Row::new(vec![1.into(), "Bo".into()]))]
    );
}

// =============================================================================
// Insert
// =============================================================================

#[test]
fn test_insert_appears_once_and_undo_restores_prior_rows() {
    let conn = seeded_connection();
    let mut undo = UndoManager::new();
    let before = TableEditor::new(&conn, &mut undo, "items").rows().unwrap();

    let rows = TableEditor::new(&conn, &mut undo, "items")
        .insert(
            &cols(&["sku", "qty"]),
            &[Value::from("d-4"), Value::Integer(2)],
        )
        .unwrap();
    let matches = rows
        .plain_rows()
        .filter(|r| r.get(0) == Some(&Value::from("d-4")))
        .count();
    assert_eq!(matches, 1);
    assert_eq!(
        rows.find(&Value::from("d-4")),
        Some(&Row::new(vec!["d-4".into(), 2.into(), Value::Null]))
    );

    let after_undo = undo.undo(&conn).unwrap();
    assert_eq!(snapshot(&after_undo), snapshot(&before));
}

#[test]
fn test_second_mutation_replaces_undo() {
    let mut session = people_session();
    session
        .insert("people", &cols(&["name"]), &[Value::from("A")])
        .unwrap();
    session
        .insert("people", &cols(&["name"]), &[Value::from("B")])
        .unwrap();

    let rows = session.undo().unwrap();
    let names: Vec<_> = rows.plain_rows().map(|r| r.values()[1].clone()).collect();
    assert_eq!(names, vec![Value::from("A")]);

    assert!(matches!(
        session.undo(),
        Err(ManagerError::NoPendingOperationError)
    ));
}

#[test]
fn test_insert_into_rowid_table_and_undo() {
    let conn = seeded_connection();
    let mut undo = UndoManager::new();
    let rows = TableEditor::new(&conn, &mut undo, "notes")
        .insert(&cols(&["body"]), &[Value::from("fourth")])
        .unwrap();
    assert_eq!(rows.len(), 4);
    assert_eq!(rows.find(&Value::Integer(4)).unwrap().get(0), Some(&Value::from("fourth")));

    let rows = undo.undo(&conn).unwrap();
    assert_eq!(rows.len(), 3);
    assert!(rows.find(&Value::Integer(4)).is_none());
}

// =============================================================================
// Update
// =============================================================================

#[test]
fn test_update_then_undo_restores_old_values() {
    let conn = seeded_connection();
    let mut undo = UndoManager::new();
    let key = Value::from("c-3");

    let rows = TableEditor::new(&conn, &mut undo, "items")
        .update(
            &key,
            &cols(&["qty", "price"]),
            &[Value::Integer(1), Value::Real(2.0)],
            &[Value::Integer(7), Value::Real(9.25)],
        )
        .unwrap();
    assert_eq!(
        rows.find(&key),
        Some(&Row::new(vec!["c-3".into(), 1.into(), 2.0.into()]))
    );

    let rows = undo.undo(&conn).unwrap();
    assert_eq!(
        rows.find(&key),
        Some(&Row::new(vec!["c-3".into(), 7.into(), 9.25.into()]))
    );
}

#[test]
fn test_update_unknown_key_performs_no_write() {
    let conn = seeded_connection();
    let mut undo = UndoManager::new();
    let before = TableEditor::new(&conn, &mut undo, "items").rows().unwrap();

    let err = TableEditor::new(&conn, &mut undo, "items")
        .update(
            &Value::from("zzz"),
            &cols(&["qty"]),
            &[Value::Integer(0)],
            &[Value::Integer(0)],
        )
        .unwrap_err();
    assert!(matches!(err, ManagerError::MutationError(_)));

    let after = TableEditor::new(&conn, &mut undo, "items").rows().unwrap();
    assert_eq!(snapshot(&after), snapshot(&before));
    assert!(!undo.has_pending());
}

#[test]
fn test_update_with_stale_old_values_writes_them_back() {
    let mut session = people_session();
    session
        .insert("people", &cols(&["name"]), &[Value::from("Real")])
        .unwrap();
    session
        .update(
            "people",
            &Value::Integer(1),
            &cols(&["name"]),
            &[Value::from("New")],
            &[Value::from("Stale")],
        )
        .unwrap();

    let rows = session.undo().unwrap();
    assert_eq!(
        rows.find(&Value::Integer(1)).unwrap().get(1),
        Some(&Value::from("Stale"))
    );
}

// =============================================================================
// Delete
// =============================================================================

#[test]
fn test_delete_then_undo_restores_rows() {
    let conn = seeded_connection();
    let mut undo = UndoManager::new();
    let before = TableEditor::new(&conn, &mut undo, "items").rows().unwrap();

    let rows = TableEditor::new(&conn, &mut undo, "items")
        .delete_rows(&[Value::from("c-3"), Value::from("a-1")])
        .unwrap();
    assert_eq!(rows.len(), 1);

    let rows = undo.undo(&conn).unwrap();
    let mut restored = snapshot(&rows);
    let mut expected = snapshot(&before);
    restored.sort_by_key(|(k, _)| k.to_string());
    expected.sort_by_key(|(k, _)| k.to_string());
    assert_eq!(restored, expected);
}

#[test]
fn test_delete_undo_without_declared_key_restores_values() {
    let conn = seeded_connection();
    let mut undo = UndoManager::new();

    TableEditor::new(&conn, &mut undo, "notes")
        .delete_rows(&[Value::Integer(1)])
        .unwrap();
    let rows = undo.undo(&conn).unwrap();

    // The restored row keeps its values but gets a fresh rowid.
    assert_eq!(rows.len(), 3);
    let first = rows
        .rows
        .iter()
        .find(|r| r.row.get(0) == Some(&Value::from("first")))
        .unwrap();
    assert_eq!(first.row, Row::new(vec!["first".into(), 1.into()]));
    assert_eq!(first.key, Value::Integer(4));
}

#[test]
fn test_failed_delete_batch_changes_nothing() {
    let conn = seeded_connection();
    let mut undo = UndoManager::new();

    let err = TableEditor::new(&conn, &mut undo, "items")
        .delete_rows(&[Value::from("a-1"), Value::from("nope")])
        .unwrap_err();
    assert!(matches!(err, ManagerError::MutationError(_)));

    let rows = TableEditor::new(&conn, &mut undo, "items").rows().unwrap();
    assert_eq!(rows.len(), 3);
    assert!(matches!(
        undo.undo(&conn),
        Err(ManagerError::NoPendingOperationError)
    ));
}

// =============================================================================
// Undo slot
// =============================================================================

#[test]
fn test_undo_on_empty_slot_leaves_table_unchanged() {
    let conn = seeded_connection();
    let mut undo = UndoManager::new();
    let before = TableEditor::new(&conn, &mut undo, "items").rows().unwrap();

    assert!(matches!(
        undo.undo(&conn),
        Err(ManagerError::NoPendingOperationError)
    ));
    let after = TableEditor::new(&conn, &mut undo, "items").rows().unwrap();
    assert_eq!(snapshot(&after), snapshot(&before));
}

#[test]
fn test_rename_discards_pending_undo() {
    let mut session = people_session();
    session
        .insert("people", &cols(&["name"]), &[Value::from("Ann")])
        .unwrap();
    session.rename_table("people", "persons").unwrap();
    assert!(!session.has_pending_undo());
    assert_eq!(session.row_count("persons").unwrap(), 1);
}

#[test]
fn test_pending_record_describes_last_mutation() {
    let mut session = people_session();
    session
        .insert("people", &cols(&["name"]), &[Value::from("Ann")])
        .unwrap();
    session.delete_rows("people", &[Value::Integer(1)]).unwrap();
    match session.pending_undo() {
        Some(UndoRecord::Delete { deleted_rows, .. }) => {
            assert_eq!(deleted_rows, &vec![Row::new(vec![1.into(), "Ann".into()])]);
        }
        other => panic!("unexpected record: {other:?}"),
    }
}

// =============================================================================
// Files: create, backup, import, export
// =============================================================================

#[test]
fn test_create_refuses_existing_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("app.db");
    Session::create(&path).unwrap();
    assert!(matches!(
        Session::create(&path),
        Err(ManagerError::AlreadyExists(_))
    ));
}

#[test]
fn test_open_missing_file_fails() {
    let dir = TempDir::new().unwrap();
    assert!(Session::open(dir.path().join("missing.db")).is_err());
}

#[test]
fn test_backup_and_summary() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("app.db");
    let mut session = Session::create(&path).unwrap();
    session.run_script("CREATE TABLE t (x); INSERT INTO t VALUES (1);").unwrap();

    let summary = session.summary().unwrap();
    assert_eq!(summary.path.as_deref(), Some(path.as_path()));
    assert_eq!(summary.table_count, 1);
    assert!(summary.size_bytes.unwrap() > 0);

    let backup = dir.path().join("copy.db");
    session.backup(&backup).unwrap();
    let copy = Session::open(&backup).unwrap();
    assert_eq!(copy.row_count("t").unwrap(), 1);

    assert!(matches!(
        session.backup(&backup),
        Err(ManagerError::AlreadyExists(_))
    ));
}

#[test]
fn test_csv_import_and_export() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in.csv");
    std::fs::write(&input, "id,name\n10,Ann\n11,\"Bo, Jr\"\n").unwrap();

    let mut session = people_session();
    assert_eq!(session.import_csv("people", &input).unwrap(), 2);
    let rows = session.rows("people").unwrap();
    assert_eq!(
        rows.find(&Value::Integer(11)).unwrap().get(1),
        Some(&Value::from("Bo, Jr"))
    );

    let output = dir.path().join("out.csv");
    assert_eq!(session.export_csv("people", &output).unwrap(), 2);
    let text = std::fs::read_to_string(&output).unwrap();
    assert_eq!(text, "id,name\n10,Ann\n11,\"Bo, Jr\"\n");
}

#[test]
fn test_csv_import_is_all_or_nothing() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in.csv");
    std::fs::write(&input, "id,name\n1,Ann\n2\n").unwrap();

    let mut session = people_session();
    let err = session.import_csv("people", &input).unwrap_err();
    assert!(matches!(err, ManagerError::MutationError(_)));
    assert_eq!(session.row_count("people").unwrap(), 0);
}

#[test]
fn test_json_import() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in.json");
    let data = json!([
        {"name": "Ann"},
        {"id": 7, "name": "Bo"},
        {}
    ]);
    std::fs::write(&input, data.to_string()).unwrap();

    let mut session = people_session();
    assert_eq!(session.import_json("people", &input).unwrap(), 3);
    let rows = session.rows("people").unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(
        rows.find(&Value::Integer(7)).unwrap().get(1),
        Some(&Value::from("Bo"))
    );
    assert_eq!(rows.find(&Value::Integer(8)).unwrap().get(1), Some(&Value::Null));
}

#[test]
fn test_json_import_rejects_non_array() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("in.json");
    std::fs::write(&input, r#"{"name": "Ann"}"#).unwrap();

    let mut session = people_session();
    assert!(matches!(
        session.import_json("people", &input),
        Err(ManagerError::TransferError(_))
    ));
}

#[test]
fn test_export_schema_file() {
    let dir = TempDir::new().unwrap();
    let output = dir.path().join("schema.txt");
    let mut session = people_session();
    session.export_schema(&output).unwrap();

    let text = std::fs::read_to_string(&output).unwrap();
    assert!(text.starts_with("Schema for people:\ncid | name | type | notnull | dflt_value | pk\n"));
    assert!(text.contains("0 | id | INTEGER | 0 | NULL | 1\n"));
}

// =============================================================================
// Ad-hoc SQL and sample data
// =============================================================================

#[test]
fn test_query_outcomes() {
    let mut session = people_session();
    assert_eq!(
        session
            .run_query("INSERT INTO people (name) VALUES ('x'), ('y')")
            .unwrap(),
        QueryOutcome::Executed { affected: 2 }
    );
    match session.run_query("SELECT name FROM people ORDER BY id").unwrap() {
        QueryOutcome::Rows { columns, rows } => {
            assert_eq!(columns, vec!["name"]);
            assert_eq!(rows, vec![Row::new(vec!["x".into()]), Row::new(vec!["y".into()])]);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(session.history().len(), 2);
}

#[test]
fn test_sample_rows_are_undoable() {
    let mut session = people_session();
    session.generate_sample("people").unwrap();
    let rows = session.generate_sample("people").unwrap();
    assert_eq!(
        rows.find(&Value::Integer(2)).unwrap().get(1),
        Some(&Value::from("Sample 2"))
    );

    let rows = session.undo().unwrap();
    assert_eq!(rows.len(), 1);
}
