//! Fast bulk path: one textual multi-row INSERT per batch
//!
//! Values are inlined with `helvetia_sql::literal` escaping instead of bound
//! as parameters. Only this module builds statement text from record values.

use helvetia_sql::literal::escape_tuple;
use helvetia_sql::{quote_ident, SqlValue, TableRef};

/// Builder for `INSERT IGNORE INTO t (cols) VALUES (...),\n(...)`
pub struct RawInsertBuilder {
    head: String,
    width: usize,
    tuples: Vec<String>,
}

impl RawInsertBuilder {
    pub fn new(table: &TableRef, columns: &[&str]) -> Self {
        let cols: Vec<String> = columns.iter().map(|c| quote_ident(c)).collect();
        Self {
            head: format!("INSERT IGNORE INTO {}\n({}) VALUES ", table, cols.join(", ")),
            width: columns.len(),
            tuples: Vec::new(),
        }
    }

    pub fn push(&mut self, values: &[SqlValue]) {
        debug_assert_eq!(values.len(), self.width);
        self.tuples.push(escape_tuple(values));
    }

    pub fn len(&self) -> usize {
        self.tuples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tuples.is_empty()
    }

    /// The statement, or `None` when no rows were pushed
    pub fn finish(self) -> Option<String> {
        if self.tuples.is_empty() {
            return None;
        }
        let body = self.tuples.join(",\n");
        let mut sql = String::with_capacity(self.head.len() + body.len());
        sql.push_str(&self.head);
        sql.push_str(&body);
        Some(sql)
    }
}
