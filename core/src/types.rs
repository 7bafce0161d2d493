//! Data model for schema-agnostic table editing.
//!
//! A table's shape is never known at compile time. It is discovered at
//! runtime as a sequence of [`ColumnInfo`] values and threaded through every
//! operation as plain data. Rows are positional sequences of loosely typed
//! [`Value`]s aligned with that column sequence.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Name of the implicit row locator SQLite assigns to every ordinary table.
pub const ROWID: &str = "rowid";

/// A single scalar cell value.
///
/// Mirrors the five SQLite storage classes. No coercion is ever applied by
/// this crate; the engine decides the stored type from column affinity.
///
/// # Examples
///
/// ```
/// use dbkeeper_core::Value;
///
/// assert_eq!(Value::from(42), Value::Integer(42));
/// assert_eq!(Value::from("Ann"), Value::Text("Ann".into()));
/// assert_eq!(Value::from(None::<i64>), Value::Null);
/// assert_eq!(Value::Text("Ann".into()).to_string(), "Ann");
/// assert_eq!(Value::Null.to_string(), "NULL");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum Value {
    /// SQL `NULL`.
    #[default]
    Null,
    /// 64-bit signed integer.
    Integer(i64),
    /// 64-bit float.
    Real(f64),
    /// UTF-8 text.
    Text(String),
    /// Raw bytes.
    Blob(Vec<u8>),
}

impl Value {
    /// Returns `true` for [`Value::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Parses a user-typed literal.
    ///
    /// `NULL` (in any case) becomes [`Value::Null`]; everything else is kept
    /// verbatim as text.
    ///
    /// ```
    /// use dbkeeper_core::Value;
    ///
    /// assert_eq!(Value::parse_literal("null"), Value::Null);
    /// assert_eq!(Value::parse_literal("17"), Value::Text("17".into()));
    /// ```
    pub fn parse_literal(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case("null") {
            Value::Null
        } else {
            Value::Text(raw.to_string())
        }
    }

    /// Converts a JSON value into a cell value.
    ///
    /// Booleans become `0`/`1`, numbers keep integer precision where
    /// possible, and arrays or objects are stored as their JSON text.
    pub fn from_json(value: &serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Integer(i64::from(*b)),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => n.as_f64().map(Value::Real).unwrap_or(Value::Null),
            },
            serde_json::Value::String(s) => Value::Text(s.clone()),
            other => Value::Text(other.to_string()),
        }
    }

    /// Renders the value for a delimited text file: `NULL` is an empty field.
    pub fn to_field(&self) -> String {
        match self {
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }

    /// Case-insensitive substring match against the rendered value.
    pub fn contains_text(&self, needle_lower: &str) -> bool {
        self.to_string().to_lowercase().contains(needle_lower)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Integer(i) => write!(f, "{i}"),
            Value::Real(r) => write!(f, "{r}"),
            Value::Text(s) => f.write_str(s),
            Value::Blob(bytes) => {
                f.write_str("x'")?;
                for byte in bytes {
                    write!(f, "{byte:02x}")?;
                }
                f.write_str("'")
            }
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Real(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Blob(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Storage affinity derived from a declared column type.
///
/// Follows SQLite's rules in order: `INT` → integer; `CHAR`, `CLOB`, `TEXT`
/// → text; `BLOB` or no type → blob; `REAL`, `FLOA`, `DOUB` → real;
/// anything else → numeric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Affinity {
    Integer,
    Text,
    Blob,
    Real,
    Numeric,
}

impl Affinity {
    /// Determines the affinity of a declared type.
    ///
    /// ```
    /// use dbkeeper_core::Affinity;
    ///
    /// assert_eq!(Affinity::from_declared_type("INTEGER"), Affinity::Integer);
    /// assert_eq!(Affinity::from_declared_type("varchar(20)"), Affinity::Text);
    /// assert_eq!(Affinity::from_declared_type(""), Affinity::Blob);
    /// assert_eq!(Affinity::from_declared_type("DOUBLE"), Affinity::Real);
    /// assert_eq!(Affinity::from_declared_type("DECIMAL(10,5)"), Affinity::Numeric);
    /// ```
    pub fn from_declared_type(declared: &str) -> Self {
        let upper = declared.to_ascii_uppercase();
        if upper.contains("INT") {
            Affinity::Integer
        } else if upper.contains("CHAR") || upper.contains("CLOB") || upper.contains("TEXT") {
            Affinity::Text
        } else if upper.contains("BLOB") || upper.trim().is_empty() {
            Affinity::Blob
        } else if upper.contains("REAL") || upper.contains("FLOA") || upper.contains("DOUB") {
            Affinity::Real
        } else {
            Affinity::Numeric
        }
    }
}

/// Metadata for one column, as reported by the engine.
///
/// Produced fresh on every schema query and never cached: a table may be
/// renamed or recreated between two operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    /// Zero-based ordinal position.
    pub cid: i64,
    /// Column name.
    pub name: String,
    /// Declared type text (may be empty).
    pub declared_type: String,
    /// Whether the column carries a `NOT NULL` constraint.
    pub not_null: bool,
    /// Default value expression, verbatim.
    pub default_value: Option<String>,
    /// Whether the column is part of the declared primary key.
    pub primary_key: bool,
}

impl ColumnInfo {
    pub fn affinity(&self) -> Affinity {
        Affinity::from_declared_type(&self.declared_type)
    }
}

/// The column used to identify a single row for update and delete.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimaryKey {
    /// A declared primary-key column.
    Column(String),
    /// No declared key; rows are located by the implicit rowid.
    RowId,
}

impl PrimaryKey {
    /// The column name as it appears in SQL.
    pub fn column_name(&self) -> &str {
        match self {
            PrimaryKey::Column(name) => name,
            PrimaryKey::RowId => ROWID,
        }
    }

    pub fn is_row_id(&self) -> bool {
        matches!(self, PrimaryKey::RowId)
    }
}

impl fmt::Display for PrimaryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

/// An ordered sequence of values aligned with a table's column list.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row(pub Vec<Value>);

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &[Value] {
        &self.0
    }

    pub fn into_values(self) -> Vec<Value> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.0.get(index)
    }
}

impl From<Vec<Value>> for Row {
    fn from(values: Vec<Value>) -> Self {
        Self(values)
    }
}

/// A row together with the value of its primary key (or rowid).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyedRow {
    pub key: Value,
    pub row: Row,
}

/// The full contents of a table as returned after every operation.
///
/// # Examples
///
/// ```
/// use dbkeeper_core::{KeyedRow, PrimaryKey, Row, RowSet, Value};
///
/// let set = RowSet {
///     table: "people".into(),
///     columns: vec!["id".into(), "name".into()],
///     primary_key: PrimaryKey::Column("id".into()),
///     rows: vec![
///         KeyedRow { key: Value::Integer(1), row: Row::new(vec![1.into(), "Ann".into()]) },
///         KeyedRow { key: Value::Integer(2), row: Row::new(vec![2.into(), "Bo".into()]) },
///     ],
/// };
///
/// assert_eq!(set.len(), 2);
/// assert_eq!(set.find(&Value::Integer(2)).unwrap().get(1), Some(&Value::from("Bo")));
/// assert_eq!(set.filter("ann").len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowSet {
    /// Table the rows were read from.
    pub table: String,
    /// Column names in declaration order.
    pub columns: Vec<String>,
    /// Key used to populate [`KeyedRow::key`].
    pub primary_key: PrimaryKey,
    /// Rows in engine order.
    pub rows: Vec<KeyedRow>,
}

impl RowSet {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the first row whose key equals `key`.
    pub fn find(&self, key: &Value) -> Option<&Row> {
        self.rows.iter().find(|r| &r.key == key).map(|r| &r.row)
    }

    /// Iterates over the rows without their keys.
    pub fn plain_rows(&self) -> impl Iterator<Item = &Row> {
        self.rows.iter().map(|r| &r.row)
    }

    /// Keeps rows where any cell contains `term`, ignoring case.
    ///
    /// An empty term keeps every row.
    pub fn filter(&self, term: &str) -> RowSet {
        let needle = term.to_lowercase();
        let rows = self
            .rows
            .iter()
            .filter(|r| needle.is_empty() || r.row.values().iter().any(|v| v.contains_text(&needle)))
            .cloned()
            .collect();
        RowSet {
            table: self.table.clone(),
            columns: self.columns.clone(),
            primary_key: self.primary_key.clone(),
            rows,
        }
    }
}
