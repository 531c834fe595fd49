//! SqlClient trait: the unified interface for embedded and MySQL modes

use async_trait::async_trait;

use crate::error::SqlResult;
use crate::statement::{Delete, Insert, Select};
use crate::value::Row;

/// Executable SQL session.
///
/// Implemented by:
/// - `EmbeddedClient`: in-process tables, no network (for tests and local runs)
/// - `MySqlClient`: a session against MySQL or a Vitess VTGate
#[async_trait]
pub trait SqlClient: Send + Sync {
    /// Fetch rows. Zero matching rows is not an error.
    async fn select(&self, select: &Select) -> SqlResult<Vec<Row>>;

    /// Parameterized multi-row insert, executed as one batch. Returns affected rows.
    async fn insert(&self, insert: &Insert) -> SqlResult<u64>;

    /// Delete rows. Returns affected rows.
    async fn delete(&self, delete: &Delete) -> SqlResult<u64>;

    /// Execute statement text verbatim. Returns affected rows.
    async fn execute(&self, sql: &str) -> SqlResult<u64>;

    /// Commit the current transaction scope
    async fn commit(&self) -> SqlResult<()>;

    /// Close the session
    async fn close(&self) -> SqlResult<()>;
}
