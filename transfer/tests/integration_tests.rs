//! File-level tests for the transfer formats.

use dbkeeper_core::{ColumnInfo, Row, Value};
use dbkeeper_transfer::{
    ManagerConfig, TransferError, read_csv, read_json_records, render_database_schema, write_csv,
};

fn column(cid: i64, name: &str, declared_type: &str, primary_key: bool) -> ColumnInfo {
    ColumnInfo {
        cid,
        name: name.into(),
        declared_type: declared_type.into(),
        not_null: false,
        default_value: None,
        primary_key,
    }
}

#[test]
fn test_csv_export_reads_back_as_text_fields() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("people.csv");
    let rows = vec![
        Row::new(vec![Value::Integer(1), Value::from("Ann"), Value::Real(1.5)]),
        Row::new(vec![Value::Integer(2), Value::Null, Value::Blob(vec![0xab])]),
    ];

    let written = write_csv(
        &path,
        &["id".into(), "name".into(), "score".into()],
        &rows,
    )
    .unwrap();
    assert_eq!(written, 2);

    let table = read_csv(&path).unwrap();
    assert_eq!(table.headers, vec!["id", "name", "score"]);
    assert_eq!(table.records[0], vec!["1", "Ann", "1.5"]);
    assert_eq!(table.records[1][1], "");
}

#[test]
fn test_read_csv_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = read_csv(dir.path().join("absent.csv")).unwrap_err();
    assert!(matches!(err, TransferError::IoError(_)));
}

#[test]
fn test_json_records_may_name_different_columns() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rows.json");
    std::fs::write(
        &path,
        r#"[{"name": "Ann", "age": 31}, {"name": "Bo"}, {"score": 2.5}]"#,
    )
    .unwrap();

    let rows = read_json_records(&path).unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].len(), 2);
    assert_eq!(rows[1]["name"], Value::from("Bo"));
    assert!(!rows[1].contains_key("age"));
    assert_eq!(rows[2]["score"], Value::Real(2.5));
}

#[test]
fn test_database_schema_lists_tables_in_order() {
    let people = vec![column(0, "id", "INTEGER", true), column(1, "name", "TEXT", false)];
    let notes = vec![column(0, "body", "", false)];

    let text = render_database_schema([("notes", notes.as_slice()), ("people", people.as_slice())]);
    let notes_at = text.find("Schema for notes:").unwrap();
    let people_at = text.find("Schema for people:").unwrap();
    assert!(notes_at < people_at);
    assert!(text.contains("0 | body |  | 0 | NULL | 0\n"));
    assert!(text.contains("1 | name | TEXT | 0 | NULL | 0\n"));
}

#[test]
fn test_partial_config_file_keeps_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dbkeeper.yaml");
    std::fs::write(&path, "sample_text: Demo\n").unwrap();

    let config = ManagerConfig::load(&path).unwrap();
    assert_eq!(config.sample_text, "Demo");
    assert_eq!(config.log_filter, ManagerConfig::default().log_filter);
    assert!(config.default_database.is_none());
}

#[test]
fn test_malformed_config_is_yaml_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dbkeeper.yaml");
    std::fs::write(&path, "history_limit: [1, 2\n").unwrap();

    let err = ManagerConfig::load(&path).unwrap_err();
    assert!(matches!(err, TransferError::YamlError(_)));
}
