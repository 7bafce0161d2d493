//! Plain-text rendering of table schemas.

use std::fmt::Write as _;

use dbkeeper_core::ColumnInfo;

const HEADER: &str = "cid | name | type | notnull | dflt_value | pk";

/// Renders one table's columns as a pipe-separated block.
///
/// # Examples
///
/// ```
/// use dbkeeper_core::ColumnInfo;
/// use dbkeeper_transfer::render_table_schema;
///
/// let columns = vec![ColumnInfo {
///     cid: 0,
///     name: "id".into(),
///     declared_type: "INTEGER".into(),
///     not_null: false,
///     default_value: None,
///     primary_key: true,
/// }];
/// let text = render_table_schema("people", &columns);
/// assert!(text.starts_with("Schema for people:\n"));
/// assert!(text.contains("0 | id | INTEGER | 0 | NULL | 1\n"));
/// ```
pub fn render_table_schema(table: &str, columns: &[ColumnInfo]) -> String {
    let mut out = format!("Schema for {table}:\n{HEADER}\n{}\n", "-".repeat(HEADER.len()));
    for col in columns {
        let _ = writeln!(
            out,
            "{} | {} | {} | {} | {} | {}",
            col.cid,
            col.name,
            col.declared_type,
            u8::from(col.not_null),
            col.default_value.as_deref().unwrap_or("NULL"),
            u8::from(col.primary_key),
        );
    }
    out
}

/// Renders every table's block, separated by blank lines.
pub fn render_database_schema<'a>(
    tables: impl IntoIterator<Item = (&'a str, &'a [ColumnInfo])>,
) -> String {
    let mut out = String::new();
    for (table, columns) in tables {
        out.push_str(&render_table_schema(table, columns));
        out.push('\n');
    }
    out
}
