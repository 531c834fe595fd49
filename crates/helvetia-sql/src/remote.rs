//! MySqlClient: network session against MySQL or a Vitess VTGate
//!
//! One dedicated connection per client, so `commit` applies to the
//! statements this client issued.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::mysql::{MySqlArguments, MySqlConnectOptions, MySqlConnection, MySqlRow};
use sqlx::query::Query;
use sqlx::{Column, ConnectOptions, Connection, MySql, Row as _, TypeInfo};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::client::SqlClient;
use crate::error::{SqlError, SqlResult};
use crate::statement::{Delete, Insert, Select};
use crate::value::{Row, SqlValue};

/// Connection parameters for one session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    /// Target keyspace (database); `None` for cross-keyspace sessions
    pub database: Option<String>,
    pub autocommit: bool,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 15306, // VTGate MySQL port
            user: "root".to_string(),
            password: String::new(),
            database: None,
            autocommit: true,
        }
    }
}

impl ConnectionConfig {
    /// Same server, different keyspace
    pub fn for_keyspace(&self, keyspace: &str) -> Self {
        Self {
            database: Some(keyspace.to_string()),
            ..self.clone()
        }
    }

    pub fn with_autocommit(mut self, autocommit: bool) -> Self {
        self.autocommit = autocommit;
        self
    }
}

/// Session against a MySQL-protocol server
pub struct MySqlClient {
    conn: Mutex<Option<MySqlConnection>>,
    label: String,
}

impl MySqlClient {
    /// Open a session
    pub async fn connect(config: &ConnectionConfig) -> SqlResult<Self> {
        let mut options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password);
        if let Some(db) = &config.database {
            options = options.database(db);
        }
        options = options.disable_statement_logging();

        let label = format!(
            "{}:{}/{}",
            config.host,
            config.port,
            config.database.as_deref().unwrap_or("")
        );
        info!("Connecting to {}", label);

        let mut conn = options
            .connect()
            .await
            .map_err(|e| SqlError::Connection(format!("{}: {}", label, e)))?;
        let autocommit = if config.autocommit { 1 } else { 0 };
        sqlx::query(&format!("SET autocommit = {}", autocommit))
            .execute(&mut conn)
            .await?;

        Ok(Self {
            conn: Mutex::new(Some(conn)),
            label,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

fn bind_value<'q>(
    query: Query<'q, MySql, MySqlArguments>,
    value: &SqlValue,
) -> Query<'q, MySql, MySqlArguments> {
    match value {
        SqlValue::Null => query.bind(None::<String>),
        SqlValue::Int(i) => query.bind(*i),
        SqlValue::Float(f) => query.bind(*f),
        SqlValue::Text(s) => query.bind(s.clone()),
        SqlValue::DateTime(dt) => query.bind(*dt),
        SqlValue::Date(d) => query.bind(*d),
    }
}

/// Decode a column by its reported server type
fn decode_column(row: &MySqlRow, idx: usize) -> SqlResult<SqlValue> {
    let type_name = row.column(idx).type_info().name().to_ascii_uppercase();
    let decode_err = |e: sqlx::Error| SqlError::Decode(format!("column {}: {}", idx, e));

    let value = match type_name.as_str() {
        "NULL" => SqlValue::Null,
        "BOOLEAN" | "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" | "YEAR"
        | "TINYINT UNSIGNED" | "SMALLINT UNSIGNED" | "MEDIUMINT UNSIGNED" | "INT UNSIGNED"
        | "BIGINT UNSIGNED" => row
            .try_get_unchecked::<Option<i64>, _>(idx)
            .map_err(decode_err)?
            .map_or(SqlValue::Null, SqlValue::Int),
        "FLOAT" | "DOUBLE" | "DECIMAL" => row
            .try_get_unchecked::<Option<f64>, _>(idx)
            .map_err(decode_err)?
            .map_or(SqlValue::Null, SqlValue::Float),
        "DATETIME" | "TIMESTAMP" => row
            .try_get_unchecked::<Option<NaiveDateTime>, _>(idx)
            .map_err(decode_err)?
            .map_or(SqlValue::Null, SqlValue::DateTime),
        "DATE" => row
            .try_get_unchecked::<Option<NaiveDate>, _>(idx)
            .map_err(decode_err)?
            .map_or(SqlValue::Null, SqlValue::Date),
        // VARCHAR, TEXT, JSON, ENUM, CHAR and anything textual
        _ => row
            .try_get_unchecked::<Option<String>, _>(idx)
            .map_err(decode_err)?
            .map_or(SqlValue::Null, SqlValue::Text),
    };
    Ok(value)
}

fn to_row(row: &MySqlRow) -> SqlResult<Row> {
    let mut columns = Vec::with_capacity(row.len());
    let mut values = Vec::with_capacity(row.len());
    for idx in 0..row.len() {
        columns.push(row.column(idx).name().to_string());
        values.push(decode_column(row, idx)?);
    }
    Ok(Row::new(columns, values))
}

impl MySqlClient {
    async fn run(&self, sql: &str, params: &[&SqlValue]) -> SqlResult<u64> {
        let mut guard = self.conn.lock().await;
        let conn = guard
            .as_mut()
            .ok_or_else(|| SqlError::Connection(format!("{}: session closed", self.label)))?;
        let mut query = sqlx::query(sql);
        for value in params {
            query = bind_value(query, value);
        }
        let result = query.execute(conn).await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl SqlClient for MySqlClient {
    async fn select(&self, select: &Select) -> SqlResult<Vec<Row>> {
        let sql = select.to_sql();
        debug!("{}: {}", self.label, sql);

        let mut guard = self.conn.lock().await;
        let conn = guard
            .as_mut()
            .ok_or_else(|| SqlError::Connection(format!("{}: session closed", self.label)))?;
        let mut query = sqlx::query(&sql);
        for value in select.params() {
            query = bind_value(query, value);
        }
        let rows = query.fetch_all(conn).await?;
        rows.iter().map(to_row).collect()
    }

    async fn insert(&self, insert: &Insert) -> SqlResult<u64> {
        if insert.is_empty() {
            return Ok(0);
        }
        debug!("{}: insert {} rows into {}", self.label, insert.rows.len(), insert.table);
        // Wide batches go out as several statements on this session, so a
        // later commit still covers all of them
        let mut affected = 0;
        for chunk in insert.statement_chunks() {
            let sql = insert.to_sql_for(chunk.len());
            let params: Vec<&SqlValue> = chunk.iter().flatten().collect();
            affected += self.run(&sql, &params).await?;
        }
        Ok(affected)
    }

    async fn delete(&self, delete: &Delete) -> SqlResult<u64> {
        let sql = delete.to_sql();
        debug!("{}: {}", self.label, sql);
        self.run(&sql, &[]).await
    }

    async fn execute(&self, sql: &str) -> SqlResult<u64> {
        let mut guard = self.conn.lock().await;
        let conn = guard
            .as_mut()
            .ok_or_else(|| SqlError::Connection(format!("{}: session closed", self.label)))?;
        // A bare &str is sent unprepared over the text protocol, no
        // placeholder parsing
        let result = sqlx::Executor::execute(&mut *conn, sql).await?;
        Ok(result.rows_affected())
    }

    async fn commit(&self) -> SqlResult<()> {
        self.execute("COMMIT").await.map(|_| ())
    }

    async fn close(&self) -> SqlResult<()> {
        if let Some(conn) = self.conn.lock().await.take() {
            info!("Closing {}", self.label);
            conn.close().await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_session<T: SqlClient + Send + Sync + 'static>() {}

    #[test]
    fn test_mysql_client_is_a_shareable_session() {
        // Fails to build if any trait method future is not Send
        assert_session::<MySqlClient>();
        let _: Box<dyn SqlClient> = Box::new(MySqlClient {
            conn: Mutex::new(None),
            label: "offline".into(),
        });
    }

    #[tokio::test]
    async fn test_closed_session_reports_connection_error() {
        let client = MySqlClient {
            conn: Mutex::new(None),
            label: "offline".into(),
        };
        assert!(matches!(client.execute("COMMIT").await, Err(SqlError::Connection(_))));
        assert!(client.close().await.is_ok());
    }

    #[test]
    fn test_connection_config_defaults() {
        let config = ConnectionConfig::default();
        assert_eq!(config.port, 15306);
        assert_eq!(config.user, "root");

        let read = config.for_keyspace("read_keyspace").with_autocommit(false);
        assert_eq!(read.database.as_deref(), Some("read_keyspace"));
        assert!(!read.autocommit);
        assert_eq!(read.host, config.host);
    }
}
