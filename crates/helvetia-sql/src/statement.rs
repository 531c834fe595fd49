//! Statement builders
//!
//! Statements are plain data so that both the MySQL client (which renders
//! them to text with `?` placeholders) and the embedded client (which applies
//! them directly) can consume them.

use crate::value::SqlValue;
use std::fmt;

/// A table, optionally qualified by keyspace
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TableRef {
    pub keyspace: Option<String>,
    pub name: String,
}

impl TableRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            keyspace: None,
            name: name.into(),
        }
    }

    pub fn qualified(keyspace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            keyspace: Some(keyspace.into()),
            name: name.into(),
        }
    }

    /// Key used by the embedded store: `keyspace.table` or `table`
    pub fn key(&self) -> String {
        match &self.keyspace {
            Some(ks) => format!("{}.{}", ks, self.name),
            None => self.name.clone(),
        }
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.keyspace {
            Some(ks) => write!(f, "{}.{}", quote_ident(ks), quote_ident(&self.name)),
            None => write!(f, "{}", quote_ident(&self.name)),
        }
    }
}

/// Back-quote an identifier. `read`, `user` and friends are reserved words.
pub fn quote_ident(ident: &str) -> String {
    format!("`{}`", ident.replace('`', "``"))
}

/// `SELECT cols FROM table [WHERE col = ?]`
#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    pub table: TableRef,
    pub columns: Vec<String>,
    pub filter: Option<(String, SqlValue)>,
}

impl Select {
    pub fn new(table: TableRef, columns: &[&str]) -> Self {
        Self {
            table,
            columns: columns.iter().map(|c| c.to_string()).collect(),
            filter: None,
        }
    }

    /// Restrict to rows where `column = value`
    pub fn filter_eq(mut self, column: &str, value: impl Into<SqlValue>) -> Self {
        self.filter = Some((column.to_string(), value.into()));
        self
    }

    pub fn to_sql(&self) -> String {
        let cols: Vec<String> = self.columns.iter().map(|c| quote_ident(c)).collect();
        let mut sql = format!("SELECT {} FROM {}", cols.join(", "), self.table);
        if let Some((col, _)) = &self.filter {
            sql.push_str(&format!(" WHERE {} = ?", quote_ident(col)));
        }
        sql
    }

    pub fn params(&self) -> Vec<&SqlValue> {
        self.filter.iter().map(|(_, v)| v).collect()
    }
}

/// What to do when an inserted row collides with a unique key
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OnConflict {
    /// Abort with a duplicate-key error
    #[default]
    Fail,
    /// `INSERT IGNORE`: skip the row
    Ignore,
    /// `ON DUPLICATE KEY UPDATE c = VALUES(c), ...`
    Update(Vec<String>),
}

/// Most `?` placeholders MySQL accepts in one prepared statement
pub const MAX_PLACEHOLDERS: usize = 65_535;

/// Parameterized multi-row insert
#[derive(Debug, Clone, PartialEq)]
pub struct Insert {
    pub table: TableRef,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<SqlValue>>,
    pub on_conflict: OnConflict,
    /// Column set to `CURRENT_TIMESTAMP` whenever an upsert hits an
    /// existing row
    pub stamp: Option<String>,
}

impl Insert {
    pub fn new(table: TableRef, columns: &[&str]) -> Self {
        Self {
            table,
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: Vec::new(),
            on_conflict: OnConflict::Fail,
            stamp: None,
        }
    }

    pub fn on_conflict(mut self, on_conflict: OnConflict) -> Self {
        self.on_conflict = on_conflict;
        self
    }

    pub fn stamp_on_update(mut self, column: &str) -> Self {
        self.stamp = Some(column.to_string());
        self
    }

    /// Append one value tuple. Its arity must match the column list.
    pub fn push_row(&mut self, row: Vec<SqlValue>) {
        debug_assert_eq!(row.len(), self.columns.len());
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows that fit in one prepared statement under [`MAX_PLACEHOLDERS`]
    pub fn rows_per_statement(&self) -> usize {
        (MAX_PLACEHOLDERS / self.columns.len().max(1)).max(1)
    }

    /// The rows split into statement-sized groups, in order
    pub fn statement_chunks(&self) -> std::slice::Chunks<'_, Vec<SqlValue>> {
        self.rows.chunks(self.rows_per_statement())
    }

    /// Render the statement for `rows` value tuples
    pub fn to_sql_for(&self, rows: usize) -> String {
        let verb = match self.on_conflict {
            OnConflict::Ignore => "INSERT IGNORE INTO",
            _ => "INSERT INTO",
        };
        let cols: Vec<String> = self.columns.iter().map(|c| quote_ident(c)).collect();
        let placeholders = format!("({})", vec!["?"; self.columns.len()].join(", "));
        let tuples = vec![placeholders; rows].join(", ");

        let mut sql = format!("{} {} ({}) VALUES {}", verb, self.table, cols.join(", "), tuples);
        if let OnConflict::Update(update_cols) = &self.on_conflict {
            let mut assignments: Vec<String> = update_cols
                .iter()
                .map(|c| format!("{0} = VALUES({0})", quote_ident(c)))
                .collect();
            if let Some(stamp) = &self.stamp {
                assignments.push(format!("{} = CURRENT_TIMESTAMP", quote_ident(stamp)));
            }
            sql.push_str(" ON DUPLICATE KEY UPDATE ");
            sql.push_str(&assignments.join(", "));
        }
        sql
    }

    pub fn to_sql(&self) -> String {
        self.to_sql_for(self.rows.len())
    }
}

/// `DELETE FROM table [LIMIT n]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delete {
    pub table: TableRef,
    pub limit: Option<usize>,
}

impl Delete {
    pub fn all(table: TableRef) -> Self {
        Self { table, limit: None }
    }

    pub fn limited(table: TableRef, limit: usize) -> Self {
        Self {
            table,
            limit: Some(limit),
        }
    }

    pub fn to_sql(&self) -> String {
        match self.limit {
            Some(n) => format!("DELETE FROM {} LIMIT {}", self.table, n),
            None => format!("DELETE FROM {}", self.table),
        }
    }
}
