//! Plain-text rendering and argument parsing shared by subcommands and the
//! shell.

use std::fmt::Write as _;

use dbkeeper_core::{Row, RowMap, RowSet, ROWID, Value};

/// Renders rows as `a | b | c` lines under a header and a dashed rule.
pub fn render_table<'a>(columns: &[String], rows: impl IntoIterator<Item = &'a Row>) -> String {
    let header = columns.join(" | ");
    let mut out = format!("{header}\n{}\n", "-".repeat(header.len().max(1)));
    let mut count = 0;
    for row in rows {
        let line = row
            .values()
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" | ");
        let _ = writeln!(out, "{line}");
        count += 1;
    }
    let _ = write!(out, "({count} row{})", if count == 1 { "" } else { "s" });
    out
}

/// Renders a row set. Tables keyed by rowid get a leading `rowid` column so
/// that rows can be addressed.
pub fn render_row_set(rows: &RowSet) -> String {
    if !rows.primary_key.is_row_id() {
        return render_table(&rows.columns, rows.plain_rows());
    }
    let columns = std::iter::once(ROWID.to_string())
        .chain(rows.columns.iter().cloned())
        .collect::<Vec<_>>();
    let keyed = rows
        .rows
        .iter()
        .map(|r| {
            let mut values = Vec::with_capacity(r.row.len() + 1);
            values.push(r.key.clone());
            values.extend(r.row.values().iter().cloned());
            Row::new(values)
        })
        .collect::<Vec<_>>();
    render_table(&columns, &keyed)
}

/// `name: value` lines.
pub fn render_details(details: &RowMap) -> String {
    details
        .iter()
        .map(|(name, value)| format!("{name}: {value}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Splits `column=value` arguments into parallel column and value lists.
///
/// The value `NULL` (any case) is a null; everything else is text.
pub fn parse_assignments(raw: &[String]) -> Result<(Vec<String>, Vec<Value>), String> {
    let pairs = raw
        .iter()
        .map(|arg| {
            let (column, value) = arg
                .split_once('=')
                .ok_or_else(|| format!("expected column=value, got '{arg}'"))?;
            Ok((column.trim().to_string(), Value::parse_literal(value)))
        })
        .collect::<Result<Vec<_>, String>>()?;
    Ok(pairs.into_iter().unzip())
}

/// Old values of `columns` from the row as currently stored.
pub fn current_values(details: &RowMap, columns: &[String]) -> Result<Vec<Value>, String> {
    columns
        .iter()
        .map(|c| {
            details
                .get(c)
                .cloned()
                .ok_or_else(|| format!("unknown column '{c}'"))
        })
        .collect()
}
