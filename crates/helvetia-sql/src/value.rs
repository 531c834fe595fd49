//! Column values and result rows

use chrono::{NaiveDate, NaiveDateTime};
use std::fmt;

/// A single column value as sent to or read from the store
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
    DateTime(NaiveDateTime),
    Date(NaiveDate),
}

impl SqlValue {
    /// Check if value is null
    pub fn is_null(&self) -> bool {
        matches!(self, SqlValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SqlValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SqlValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<NaiveDateTime> {
        match self {
            SqlValue::DateTime(dt) => Some(*dt),
            // DATETIME columns written as text through the raw path
            SqlValue::Text(s) => NaiveDateTime::parse_from_str(s, DATETIME_FORMAT).ok(),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            SqlValue::Date(d) => Some(*d),
            SqlValue::DateTime(dt) => Some(dt.date()),
            SqlValue::Text(s) => NaiveDate::parse_from_str(s, DATE_FORMAT).ok(),
            _ => None,
        }
    }

    /// Get type name as string
    pub fn type_name(&self) -> &'static str {
        match self {
            SqlValue::Null => "Null",
            SqlValue::Int(_) => "Int",
            SqlValue::Float(_) => "Float",
            SqlValue::Text(_) => "Text",
            SqlValue::DateTime(_) => "DateTime",
            SqlValue::Date(_) => "Date",
        }
    }
}

/// `YYYY-MM-DD HH:MM:SS`
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
/// `YYYY-MM-DD`
pub const DATE_FORMAT: &str = "%Y-%m-%d";

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => write!(f, "NULL"),
            SqlValue::Int(i) => write!(f, "{}", i),
            SqlValue::Float(fl) => write!(f, "{}", fl),
            SqlValue::Text(s) => write!(f, "{}", s),
            SqlValue::DateTime(dt) => write!(f, "{}", dt.format(DATETIME_FORMAT)),
            SqlValue::Date(d) => write!(f, "{}", d.format(DATE_FORMAT)),
        }
    }
}

// Convenience conversions
impl From<String> for SqlValue {
    fn from(s: String) -> Self {
        SqlValue::Text(s)
    }
}

impl From<&str> for SqlValue {
    fn from(s: &str) -> Self {
        SqlValue::Text(s.to_string())
    }
}

impl From<i64> for SqlValue {
    fn from(i: i64) -> Self {
        SqlValue::Int(i)
    }
}

impl From<u64> for SqlValue {
    fn from(i: u64) -> Self {
        SqlValue::Int(i as i64)
    }
}

impl From<u32> for SqlValue {
    fn from(i: u32) -> Self {
        SqlValue::Int(i as i64)
    }
}

impl From<u8> for SqlValue {
    fn from(i: u8) -> Self {
        SqlValue::Int(i as i64)
    }
}

impl From<f64> for SqlValue {
    fn from(f: f64) -> Self {
        SqlValue::Float(f)
    }
}

impl From<NaiveDateTime> for SqlValue {
    fn from(dt: NaiveDateTime) -> Self {
        SqlValue::DateTime(dt)
    }
}

impl From<NaiveDate> for SqlValue {
    fn from(d: NaiveDate) -> Self {
        SqlValue::Date(d)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(SqlValue::Null)
    }
}

/// A fetched row: column names paired with values, in select order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<SqlValue>,
}

impl Row {
    pub fn new(columns: Vec<String>, values: Vec<SqlValue>) -> Self {
        debug_assert_eq!(columns.len(), values.len());
        Self { columns, values }
    }

    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|i| &self.values[i])
    }

    /// String value; `None` for NULL or a missing column
    pub fn get_str(&self, column: &str) -> Option<&str> {
        self.get(column).and_then(SqlValue::as_str)
    }

    pub fn get_i64(&self, column: &str) -> Option<i64> {
        self.get(column).and_then(SqlValue::as_i64)
    }

    pub fn get_datetime(&self, column: &str) -> Option<NaiveDateTime> {
        self.get(column).and_then(SqlValue::as_datetime)
    }

    pub fn get_date(&self, column: &str) -> Option<NaiveDate> {
        self.get(column).and_then(SqlValue::as_date)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[SqlValue] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
