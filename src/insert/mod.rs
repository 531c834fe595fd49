//! Batch insertion per target table
//!
//! Users and articles go through one parameterized multi-row statement per
//! batch. Reads use the fast bulk path with `INSERT IGNORE`, so rows that
//! collide on `(uid, aid)` are dropped by the server and the affected-row
//! count may be lower than the batch length.

pub mod fast_path;

pub use fast_path::RawInsertBuilder;

use async_trait::async_trait;
use helvetia_sql::{Insert, SqlClient};
use tracing::debug;

use crate::error::PipelineResult;
use crate::model::{Article, Read, User};
use crate::schema::{Keyspace, ARTICLE_COLUMNS, READ_COLUMNS, USER_COLUMNS};

/// A record type that knows how to write a batch of itself
#[async_trait]
pub trait BulkInsert: Sized + Send + Sync {
    const KEYSPACE: Keyspace;

    /// Insert one batch. Returns the server's affected-row count, which is
    /// informational only.
    async fn insert_batch<C: SqlClient + ?Sized>(client: &C, batch: &[Self]) -> PipelineResult<u64>;
}

#[async_trait]
impl BulkInsert for User {
    const KEYSPACE: Keyspace = Keyspace::User;

    async fn insert_batch<C: SqlClient + ?Sized>(client: &C, batch: &[Self]) -> PipelineResult<u64> {
        if batch.is_empty() {
            return Ok(0);
        }
        let mut insert = Insert::new(Self::KEYSPACE.table(), USER_COLUMNS);
        for user in batch {
            insert.push_row(user.to_row()?);
        }
        Ok(client.insert(&insert).await?)
    }
}

#[async_trait]
impl BulkInsert for Article {
    const KEYSPACE: Keyspace = Keyspace::Article;

    async fn insert_batch<C: SqlClient + ?Sized>(client: &C, batch: &[Self]) -> PipelineResult<u64> {
        if batch.is_empty() {
            return Ok(0);
        }
        let mut insert = Insert::new(Self::KEYSPACE.table(), ARTICLE_COLUMNS);
        for article in batch {
            insert.push_row(article.to_row()?);
        }
        Ok(client.insert(&insert).await?)
    }
}

#[async_trait]
impl BulkInsert for Read {
    const KEYSPACE: Keyspace = Keyspace::Read;

    async fn insert_batch<C: SqlClient + ?Sized>(client: &C, batch: &[Self]) -> PipelineResult<u64> {
        let Some(sql) = build_read_statement(batch) else {
            return Ok(0);
        };
        Ok(client.execute(&sql).await?)
    }
}

/// Raw `INSERT IGNORE` text for a batch of reads
pub fn build_read_statement(batch: &[Read]) -> Option<String> {
    let mut builder = RawInsertBuilder::new(&Keyspace::Read.table(), READ_COLUMNS);
    for read in batch {
        builder.push(&read.to_row());
    }
    builder.finish()
}

/// Insert a batch and commit it
pub async fn flush_batch<R: BulkInsert, C: SqlClient + ?Sized>(
    client: &C,
    batch: &[R],
) -> PipelineResult<u64> {
    let affected = R::insert_batch(client, batch).await?;
    client.commit().await?;
    debug!(
        "Committed {} {} rows ({} affected)",
        batch.len(),
        R::KEYSPACE.table_name(),
        affected
    );
    Ok(affected)
}
