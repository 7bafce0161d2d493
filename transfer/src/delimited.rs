//! CSV import and export.
//!
//! Import treats the first line as a header and returns every following
//! record as raw text fields; records may differ in width, the database
//! decides whether a record fits. Export writes a header of column names and
//! one line per row, with `NULL` as an empty field.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use dbkeeper_core::Row;
use tracing::debug;

use crate::error::{Result, TransferError};

/// Parsed contents of a CSV file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvTable {
    /// Header fields.
    pub headers: Vec<String>,
    /// Data records, header excluded.
    pub records: Vec<Vec<String>>,
}

/// Reads a CSV file from disk.
///
/// # Errors
///
/// Returns [`TransferError::MissingHeader`] for an empty file, and I/O or
/// CSV errors for unreadable input.
pub fn read_csv(path: impl AsRef<Path>) -> Result<CsvTable> {
    let path = path.as_ref();
    debug!(path = %path.display(), "reading CSV");
    read_csv_from(File::open(path)?)
}

/// Reads CSV data from any reader.
///
/// # Examples
///
/// ```
/// use dbkeeper_transfer::read_csv_from;
///
/// let table = read_csv_from("id,name\n1,Ann\n2,Bo\n".as_bytes()).unwrap();
/// assert_eq!(table.headers, vec!["id", "name"]);
/// assert_eq!(table.records.len(), 2);
/// assert_eq!(table.records[1], vec!["2", "Bo"]);
/// ```
pub fn read_csv_from<R: Read>(reader: R) -> Result<CsvTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = reader.headers()?.iter().map(String::from).collect();
    if headers.is_empty() {
        return Err(TransferError::MissingHeader);
    }

    let records = reader
        .records()
        .map(|record| record.map(|r| r.iter().map(String::from).collect()))
        .collect::<std::result::Result<Vec<Vec<String>>, _>>()?;

    Ok(CsvTable { headers, records })
}

/// Writes a header and rows to a CSV file, returning the number of rows.
pub fn write_csv<'a>(
    path: impl AsRef<Path>,
    columns: &[String],
    rows: impl IntoIterator<Item = &'a Row>,
) -> Result<usize> {
    let path = path.as_ref();
    debug!(path = %path.display(), "writing CSV");
    write_csv_to(File::create(path)?, columns, rows)
}

/// Writes a header and rows to any writer, returning the number of rows.
pub fn write_csv_to<'a, W: Write>(
    writer: W,
    columns: &[String],
    rows: impl IntoIterator<Item = &'a Row>,
) -> Result<usize> {
    let mut writer = csv::WriterBuilder::new().flexible(true).from_writer(writer);
    writer.write_record(columns)?;

    let mut count = 0;
    for row in rows {
        writer.write_record(row.values().iter().map(|v| v.to_field()))?;
        count += 1;
    }
    writer.flush()?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use dbkeeper_core::Value;

    use super::*;

    #[test]
    fn test_read_empty_input_has_no_header() {
        let err = read_csv_from("".as_bytes()).unwrap_err();
        assert!(matches!(err, TransferError::MissingHeader));
    }

    #[test]
    fn test_read_header_only() {
        let table = read_csv_from("a,b\n".as_bytes()).unwrap();
        assert_eq!(table.headers, vec!["a", "b"]);
        assert!(table.records.is_empty());
    }

    #[test]
    fn test_read_quoted_fields() {
        let table = read_csv_from("name,note\n\"Smith, J\",\"said \"\"hi\"\"\"\n".as_bytes()).unwrap();
        assert_eq!(table.records[0], vec!["Smith, J", "said \"hi\""]);
    }

    #[test]
    fn test_read_ragged_records() {
        let table = read_csv_from("a,b\n1\n1,2,3\n".as_bytes()).unwrap();
        assert_eq!(table.records[0].len(), 1);
        assert_eq!(table.records[1].len(), 3);
    }

    #[test]
    fn test_write_nulls_as_empty_fields() {
        let rows = vec![
            Row::new(vec![Value::Integer(1), Value::Null]),
            Row::new(vec![Value::Integer(2), Value::from("x,y")]),
        ];
        let mut out = Vec::new();
        let count = write_csv_to(&mut out, &["id".into(), "note".into()], &rows).unwrap();
        assert_eq!(count, 2);
        assert_eq!(String::from_utf8(out).unwrap(), "id,note\n1,\n2,\"x,y\"\n");
    }

    #[test]
    fn test_write_then_read_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let rows = vec![Row::new(vec![Value::from("Ann")])];
        write_csv(&path, &["name".into()], &rows).unwrap();

        let table = read_csv(&path).unwrap();
        assert_eq!(table.headers, vec!["name"]);
        assert_eq!(table.records, vec![vec!["Ann".to_string()]]);
    }
}
