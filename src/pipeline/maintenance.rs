//! Table truncation and session tuning around bulk loads

use helvetia_sql::{Delete, SqlClient, SqlError, TableRef};
use tracing::{debug, info, warn};

use crate::config::RetryPolicy;
use crate::error::PipelineResult;

/// Rows removed per DELETE during truncation
pub const TRUNCATE_CHUNK: usize = 1000;

/// Settings applied before a bulk load
pub const BULK_SESSION_SETTINGS: &[&str] = &["SET unique_checks = 0", "SET foreign_key_checks = 0"];

/// Settings restoring normal checking afterwards
pub const RESTORE_SESSION_SETTINGS: &[&str] = &["SET unique_checks = 1", "SET foreign_key_checks = 1"];

/// Makes backslashes ordinary characters in string literals, so inline
/// escaping only has to double single quotes
pub const NO_BACKSLASH_ESCAPES: &str = "SET SESSION sql_mode = CONCAT(@@sql_mode, ',NO_BACKSLASH_ESCAPES')";

/// Apply session settings. Not every backend accepts them, so failures are
/// logged and skipped.
pub async fn apply_settings<C: SqlClient + ?Sized>(client: &C, settings: &[&str]) -> usize {
    let mut applied = 0;
    for setting in settings {
        match client.execute(setting).await {
            Ok(_) => applied += 1,
            Err(e) => warn!("Session setting '{}' rejected: {}", setting, e),
        }
    }
    applied
}

/// Prepare a session for bulk loading. `raw_text` is set for sessions
/// that will run the inline-literal fast path.
pub async fn optimize_session<C: SqlClient + ?Sized>(client: &C, raw_text: bool) {
    apply_settings(client, BULK_SESSION_SETTINGS).await;
    if raw_text {
        apply_settings(client, &[NO_BACKSLASH_ESCAPES]).await;
    }
}

pub async fn restore_session<C: SqlClient + ?Sized>(client: &C) {
    apply_settings(client, RESTORE_SESSION_SETTINGS).await;
}

/// Empty a table in chunks, committing after each one.
///
/// A chunk that fails with a transient error (lock wait, deadlock) is
/// retried after a backoff, up to `policy.max_attempts` attempts per chunk.
/// Any other error, or running out of attempts, aborts with that error.
pub async fn truncate_table<C: SqlClient + ?Sized>(
    client: &C,
    table: &TableRef,
    policy: &RetryPolicy,
) -> PipelineResult<u64> {
    let delete = &Delete::limited(table.clone(), TRUNCATE_CHUNK);
    let mut total = 0u64;
    loop {
        let deleted = with_retry(policy, table, move || async move {
            let n = client.delete(delete).await?;
            client.commit().await?;
            Ok(n)
        })
        .await?;
        total += deleted;
        debug!("Deleted {} rows from {} ({} so far)", deleted, table.key(), total);
        if deleted == 0 {
            break;
        }
    }
    info!("Truncated {} ({} rows)", table.key(), total);
    Ok(total)
}

async fn with_retry<F, Fut, T>(policy: &RetryPolicy, table: &TableRef, mut op: F) -> PipelineResult<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, SqlError>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_transient() && attempt < policy.max_attempts => {
                let pause = policy.backoff(attempt);
                warn!(
                    "Transient error on {} (attempt {}/{}), retrying in {:?}: {}",
                    table.key(),
                    attempt,
                    policy.max_attempts,
                    pause,
                    e
                );
                if !pause.is_zero() {
                    tokio::time::sleep(pause).await;
                }
                attempt += 1;
            }
            Err(e) => return Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use helvetia_sql::error::codes;
    use helvetia_sql::{EmbeddedClient, Insert, TableSpec};

    async fn client_with_rows(n: i64) -> (EmbeddedClient, TableRef) {
        let table = TableRef::qualified("ks", "t");
        let client = EmbeddedClient::with_tables([TableSpec::new(table.clone(), &["id"]).unique(&["id"])]);
        let mut insert = Insert::new(table.clone(), &["id"]);
        for i in 0..n {
            insert.push_row(vec![i.into()]);
        }
        client.insert(&insert).await.unwrap();
        (client, table)
    }

    #[tokio::test]
    async fn test_truncate_in_chunks() {
        let (client, table) = client_with_rows(2500).await;
        let total = truncate_table(&client, &table, &RetryPolicy::immediate(3)).await.unwrap();
        assert_eq!(total, 2500);
        assert_eq!(client.row_count(&table).await, 0);
        // 1000 + 1000 + 500 + the empty chunk that ends the loop
        assert_eq!(client.commit_count().await, 4);
    }

    #[tokio::test]
    async fn test_truncate_retries_deadlocks() {
        let (client, table) = client_with_rows(10).await;
        client.fail_next(SqlError::server(codes::DEADLOCK, "Deadlock found")).await;
        client.fail_next(SqlError::server(codes::LOCK_WAIT_TIMEOUT, "Lock wait timeout")).await;
        let total = truncate_table(&client, &table, &RetryPolicy::immediate(5)).await.unwrap();
        assert_eq!(total, 10);
    }

    #[tokio::test]
    async fn test_truncate_gives_up_after_max_attempts() {
        let (client, table) = client_with_rows(10).await;
        for _ in 0..3 {
            client.fail_next(SqlError::server(codes::DEADLOCK, "Deadlock found")).await;
        }
        let err = truncate_table(&client, &table, &RetryPolicy::immediate(3)).await.unwrap_err();
        assert!(matches!(err, PipelineError::Sql(e) if e.number() == Some(codes::DEADLOCK)));
        assert_eq!(client.row_count(&table).await, 10);
    }

    #[tokio::test]
    async fn test_non_transient_error_is_not_retried() {
        let (client, table) = client_with_rows(10).await;
        client.fail_next(SqlError::Connection("gone".into())).await;
        assert!(truncate_table(&client, &table, &RetryPolicy::immediate(5)).await.is_err());
        assert_eq!(client.row_count(&table).await, 10);
    }

    #[tokio::test]
    async fn test_rejected_settings_are_skipped() {
        let client = EmbeddedClient::new();
        client.fail_next(SqlError::server(1193, "Unknown system variable")).await;
        assert_eq!(apply_settings(&client, BULK_SESSION_SETTINGS).await, 1);
    }
}
