//! EmbeddedClient: in-process SQL session over in-memory tables
//!
//! Understands exactly the statement shapes the seeding tools emit:
//! builder-based select/insert/delete plus raw multi-row `INSERT` text,
//! `SET` and `COMMIT`. Unique keys are enforced per table so that
//! `INSERT IGNORE` and upserts behave like the real store.

use async_trait::async_trait;
use chrono::{Local, SubsecRound};
use rustc_hash::FxHashMap;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::client::SqlClient;
use crate::error::{codes, SqlError, SqlResult};
use crate::literal::{self, escape_value};
use crate::statement::{Delete, Insert, OnConflict, Select, TableRef};
use crate::value::{Row, SqlValue};

const UNKNOWN_COLUMN: u16 = 1054;

/// Shape of an embedded table
#[derive(Debug, Clone)]
pub struct TableSpec {
    pub table: TableRef,
    pub columns: Vec<String>,
    /// Each entry is one unique key (primary key first by convention)
    pub unique_keys: Vec<Vec<String>>,
}

impl TableSpec {
    pub fn new(table: TableRef, columns: &[&str]) -> Self {
        Self {
            table,
            columns: columns.iter().map(|c| c.to_string()).collect(),
            unique_keys: Vec::new(),
        }
    }

    pub fn unique(mut self, key: &[&str]) -> Self {
        self.unique_keys.push(key.iter().map(|c| c.to_string()).collect());
        self
    }
}

#[derive(Debug, Clone)]
struct Table {
    spec: TableSpec,
    rows: Vec<Vec<SqlValue>>,
    /// One map per unique key: encoded key -> row position
    indexes: Vec<FxHashMap<String, usize>>,
}

enum Applied {
    Inserted,
    Updated,
    Unchanged,
    Skipped,
}

impl Table {
    fn new(spec: TableSpec) -> Self {
        let indexes = vec![FxHashMap::default(); spec.unique_keys.len()];
        Self {
            spec,
            rows: Vec::new(),
            indexes,
        }
    }

    fn column_index(&self, column: &str) -> SqlResult<usize> {
        self.spec
            .columns
            .iter()
            .position(|c| c == column)
            .ok_or_else(|| {
                SqlError::server(
                    UNKNOWN_COLUMN,
                    format!("Unknown column '{}' in '{}'", column, self.spec.table.key()),
                )
            })
    }

    /// Encoded value of one unique key, `None` when any part is NULL
    fn key_of(&self, key_no: usize, row: &[SqlValue]) -> SqlResult<Option<String>> {
        let mut parts = Vec::with_capacity(self.spec.unique_keys[key_no].len());
        for col in &self.spec.unique_keys[key_no] {
            let value = &row[self.column_index(col)?];
            if value.is_null() {
                return Ok(None);
            }
            parts.push(escape_value(value));
        }
        Ok(Some(parts.join("\u{1f}")))
    }

    fn reindex(&mut self) -> SqlResult<()> {
        let mut indexes = vec![FxHashMap::default(); self.spec.unique_keys.len()];
        for (pos, row) in self.rows.iter().enumerate() {
            for (key_no, index) in indexes.iter_mut().enumerate() {
                if let Some(key) = self.key_of(key_no, row)? {
                    index.insert(key, pos);
                }
            }
        }
        self.indexes = indexes;
        Ok(())
    }

    /// Re-point the index entries of the row at `pos` whose key changed
    fn rekey(&mut self, pos: usize, before: &[Option<String>]) -> SqlResult<()> {
        for (key_no, old) in before.iter().enumerate() {
            let new = self.key_of(key_no, &self.rows[pos])?;
            if &new == old {
                continue;
            }
            let index = &mut self.indexes[key_no];
            if let Some(old) = old {
                if index.get(old) == Some(&pos) {
                    index.remove(old);
                }
            }
            if let Some(new) = new {
                index.insert(new, pos);
            }
        }
        Ok(())
    }

    fn conflict(&self, row: &[SqlValue]) -> SqlResult<Option<usize>> {
        for key_no in 0..self.indexes.len() {
            if let Some(key) = self.key_of(key_no, row)? {
                if let Some(&pos) = self.indexes[key_no].get(&key) {
                    return Ok(Some(pos));
                }
            }
        }
        Ok(None)
    }

    fn apply_row(
        &mut self,
        columns: &[String],
        values: &[SqlValue],
        on_conflict: &OnConflict,
        stamp: Option<(usize, &SqlValue)>,
    ) -> SqlResult<Applied> {
        let mut full = vec![SqlValue::Null; self.spec.columns.len()];
        for (col, value) in columns.iter().zip(values) {
            full[self.column_index(col)?] = value.clone();
        }
        // Stands in for the column's CURRENT_TIMESTAMP default
        if let Some((idx, now)) = stamp {
            if full[idx].is_null() {
                full[idx] = now.clone();
            }
        }

        let Some(pos) = self.conflict(&full)? else {
            let pos = self.rows.len();
            for key_no in 0..self.indexes.len() {
                if let Some(key) = self.key_of(key_no, &full)? {
                    self.indexes[key_no].insert(key, pos);
                }
            }
            self.rows.push(full);
            return Ok(Applied::Inserted);
        };

        match on_conflict {
            OnConflict::Fail => Err(SqlError::server(
                codes::DUPLICATE_ENTRY,
                format!("Duplicate entry for key in '{}'", self.spec.table.key()),
            )),
            OnConflict::Ignore => Ok(Applied::Skipped),
            OnConflict::Update(update_cols) => {
                let before = (0..self.indexes.len())
                    .map(|key_no| self.key_of(key_no, &self.rows[pos]))
                    .collect::<SqlResult<Vec<_>>>()?;
                let mut targets = Vec::with_capacity(update_cols.len() + 1);
                for col in update_cols {
                    targets.push(self.column_index(col)?);
                }
                targets.extend(stamp.map(|(idx, _)| idx));

                let mut changed = false;
                for idx in targets {
                    if self.rows[pos][idx] != full[idx] {
                        self.rows[pos][idx] = full[idx].clone();
                        changed = true;
                    }
                }
                if changed {
                    self.rekey(pos, &before)?;
                    Ok(Applied::Updated)
                } else {
                    Ok(Applied::Unchanged)
                }
            }
        }
    }

    /// Apply a whole multi-row statement; on error the table is left untouched.
    fn apply_insert(
        &mut self,
        columns: &[String],
        rows: &[Vec<SqlValue>],
        on_conflict: &OnConflict,
        stamp: Option<&str>,
    ) -> SqlResult<u64> {
        let now = SqlValue::DateTime(Local::now().naive_local().trunc_subsecs(0));
        let stamp = match stamp {
            Some(col) => Some((self.column_index(col)?, &now)),
            None => None,
        };
        let mut staged = self.clone();
        let mut affected = 0u64;
        for row in rows {
            // MySQL reports 1 per inserted row and 2 per updated row
            affected += match staged.apply_row(columns, row, on_conflict, stamp)? {
                Applied::Inserted => 1,
                Applied::Updated => 2,
                Applied::Unchanged | Applied::Skipped => 0,
            };
        }
        *self = staged;
        Ok(affected)
    }
}

#[derive(Default)]
struct State {
    tables: FxHashMap<String, Table>,
    statements: Vec<String>,
    commits: usize,
    failures: VecDeque<SqlError>,
    open_sessions: usize,
}

impl State {
    fn begin(&mut self, sql: String) -> SqlResult<()> {
        self.statements.push(sql);
        match self.failures.pop_front() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn table_mut(&mut self, table: &TableRef) -> SqlResult<&mut Table> {
        self.tables
            .get_mut(&table.key())
            .ok_or_else(|| SqlError::UnknownTable(table.key()))
    }
}

/// In-process client backed by in-memory tables.
///
/// Clones are the same session. [`EmbeddedClient::session`] opens another
/// session over the same tables, so per-keyspace sessions observe each
/// other's writes the way VTGate sessions do and can be closed separately.
#[derive(Clone, Default)]
pub struct EmbeddedClient {
    state: Arc<RwLock<State>>,
    closed: Arc<AtomicBool>,
    tracked: bool,
}

impl EmbeddedClient {
    /// Create a client with no tables
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a client with the given tables defined
    pub fn with_tables(specs: impl IntoIterator<Item = TableSpec>) -> Self {
        let mut state = State::default();
        for spec in specs {
            state.tables.insert(spec.table.key(), Table::new(spec));
        }
        Self {
            state: Arc::new(RwLock::new(state)),
            ..Self::default()
        }
    }

    /// Open another session over the same tables
    pub async fn session(&self) -> Self {
        self.state.write().await.open_sessions += 1;
        Self {
            state: Arc::clone(&self.state),
            closed: Arc::new(AtomicBool::new(false)),
            tracked: true,
        }
    }

    /// Sessions from [`EmbeddedClient::session`] not yet closed
    pub async fn open_sessions(&self) -> usize {
        self.state.read().await.open_sessions
    }

    /// Define (or redefine, emptying it) a table
    pub async fn define_table(&self, spec: TableSpec) {
        let mut state = self.state.write().await;
        state.tables.insert(spec.table.key(), Table::new(spec));
    }

    /// Make the next statement fail with `err`. Failures queue up in order.
    pub async fn fail_next(&self, err: SqlError) {
        self.state.write().await.failures.push_back(err);
    }

    /// All rows of a table, as full-width rows
    pub async fn rows(&self, table: &TableRef) -> SqlResult<Vec<Row>> {
        let state = self.state.read().await;
        let t = state
            .tables
            .get(&table.key())
            .ok_or_else(|| SqlError::UnknownTable(table.key()))?;
        Ok(t.rows
            .iter()
            .map(|r| Row::new(t.spec.columns.clone(), r.clone()))
            .collect())
    }

    pub async fn row_count(&self, table: &TableRef) -> usize {
        let state = self.state.read().await;
        state.tables.get(&table.key()).map_or(0, |t| t.rows.len())
    }

    /// Every statement received, in order (builder statements rendered)
    pub async fn statements(&self) -> Vec<String> {
        self.state.read().await.statements.clone()
    }

    pub async fn commit_count(&self) -> usize {
        self.state.read().await.commits
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn ensure_open(&self) -> SqlResult<()> {
        if self.is_closed() {
            return Err(SqlError::Connection("session is closed".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl SqlClient for EmbeddedClient {
    async fn select(&self, select: &Select) -> SqlResult<Vec<Row>> {
        self.ensure_open()?;
        let mut state = self.state.write().await;
        state.begin(select.to_sql())?;
        let table = state.table_mut(&select.table)?;

        let mut positions = Vec::with_capacity(select.columns.len());
        for col in &select.columns {
            positions.push(table.column_index(col)?);
        }
        let filter = match &select.filter {
            Some((col, value)) => Some((table.column_index(col)?, value)),
            None => None,
        };

        let rows: Vec<Row> = table
            .rows
            .iter()
            .filter(|r| filter.map_or(true, |(idx, value)| &r[idx] == value))
            .map(|r| {
                Row::new(
                    select.columns.clone(),
                    positions.iter().map(|&i| r[i].clone()).collect(),
                )
            })
            .collect();
        debug!("embedded select on {} returned {} rows", select.table.key(), rows.len());
        Ok(rows)
    }

    async fn insert(&self, insert: &Insert) -> SqlResult<u64> {
        self.ensure_open()?;
        let mut state = self.state.write().await;
        state.begin(insert.to_sql())?;
        let table = state.table_mut(&insert.table)?;
        table.apply_insert(
            &insert.columns,
            &insert.rows,
            &insert.on_conflict,
            insert.stamp.as_deref(),
        )
    }

    async fn delete(&self, delete: &Delete) -> SqlResult<u64> {
        self.ensure_open()?;
        let mut state = self.state.write().await;
        state.begin(delete.to_sql())?;
        let table = state.table_mut(&delete.table)?;
        let n = delete.limit.unwrap_or(usize::MAX).min(table.rows.len());
        table.rows.drain(..n);
        table.reindex()?;
        Ok(n as u64)
    }

    async fn execute(&self, sql: &str) -> SqlResult<u64> {
        self.ensure_open()?;
        let mut state = self.state.write().await;
        state.begin(sql.to_string())?;

        let head = sql.trim_start();
        let verb = head
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_ascii_uppercase();
        match verb.as_str() {
            "INSERT" => {
                let raw = literal::parse_insert(head)?;
                let on_conflict = if raw.ignore {
                    OnConflict::Ignore
                } else {
                    OnConflict::Fail
                };
                let table = state.table_mut(&raw.table)?;
                table.apply_insert(&raw.columns, &raw.rows, &on_conflict, None)
            }
            // Session settings and transaction control have no effect here
            "SET" | "COMMIT" | "ROLLBACK" | "BEGIN" => Ok(0),
            _ => Err(SqlError::Parse(format!("unsupported statement: {}", verb))),
        }
    }

    async fn commit(&self) -> SqlResult<()> {
        self.ensure_open()?;
        let mut state = self.state.write().await;
        state.begin("COMMIT".to_string())?;
        state.commits += 1;
        Ok(())
    }

    async fn close(&self) -> SqlResult<()> {
        if !self.closed.swap(true, Ordering::SeqCst) && self.tracked {
            let mut state = self.state.write().await;
            state.open_sessions = state.open_sessions.saturating_sub(1);
        }
        Ok(())
    }
}
