//! Per-article engagement rollup (BeRead)
//!
//! Full recompute on every run: each article's four uid lists are rebuilt
//! from the complete read set and upserted by `aid`, overwriting whatever
//! a previous run stored. Running twice over unchanged reads writes the same
//! values twice; only the row's refresh timestamp moves.

use helvetia_sql::{Insert, OnConflict, Row, Select, SqlClient};
use serde::Serialize;
use tracing::{debug, info};

use crate::config::BeReadConfig;
use crate::error::PipelineResult;
use crate::generate::referential::required;
use crate::model::{BeRead, ReadStats};
use crate::pipeline::session::OpenSessions;
use crate::pipeline::SessionFactory;
use crate::schema::{Keyspace, BEREAD_COLUMNS, BEREAD_STAMP_COLUMN, BEREAD_UPDATE_COLUMNS};

/// The engagement part of one read row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadFlags {
    pub uid: String,
    pub agree: bool,
    pub comment: bool,
    pub share: bool,
}

impl ReadFlags {
    fn from_row(row: &Row) -> PipelineResult<Self> {
        let flag = |column: &str| row.get_i64(column) == Some(1);
        Ok(Self {
            uid: required(row.get_str("uid"), Keyspace::Read, "uid")?.to_string(),
            agree: flag("agreeOrNot"),
            comment: flag("commentOrNot"),
            share: flag("shareOrNot"),
        })
    }
}

/// Partition uids by flag, keeping fetch order
pub fn compute_stats(reads: &[ReadFlags]) -> ReadStats {
    let mut stats = ReadStats::default();
    for read in reads {
        stats.read_uid_list.push(read.uid.clone());
        if read.comment {
            stats.comment_uid_list.push(read.uid.clone());
        }
        if read.agree {
            stats.agree_uid_list.push(read.uid.clone());
        }
        if read.share {
            stats.share_uid_list.push(read.uid.clone());
        }
    }
    stats
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BeReadReport {
    pub articles: usize,
    pub reads: usize,
    pub batches: usize,
}

pub struct StatsAggregator {
    config: BeReadConfig,
}

impl StatsAggregator {
    pub fn new(config: BeReadConfig) -> Self {
        Self { config }
    }

    /// Build one BeRead per article. Ids are 1-based positions in the
    /// article fetch.
    pub async fn compute<A, R>(&self, articles: &A, reads: &R) -> PipelineResult<Vec<BeRead>>
    where
        A: SqlClient + ?Sized,
        R: SqlClient + ?Sized,
    {
        let article_rows = articles
            .select(&Select::new(Keyspace::Article.table(), &["aid", "category"]))
            .await?;
        info!("Aggregating reads for {} articles", article_rows.len());

        let mut out = Vec::with_capacity(article_rows.len());
        for (pos, row) in article_rows.iter().enumerate() {
            let aid = required(row.get_str("aid"), Keyspace::Article, "aid")?;
            let category = row.get_str("category").unwrap_or_default();

            let select = Select::new(
                Keyspace::Read.table(),
                &["uid", "agreeOrNot", "commentOrNot", "shareOrNot"],
            )
            .filter_eq("aid", aid);
            let flags = reads
                .select(&select)
                .await?
                .iter()
                .map(ReadFlags::from_row)
                .collect::<PipelineResult<Vec<_>>>()?;

            out.push(BeRead {
                id: pos as u64 + 1,
                aid: aid.to_string(),
                category: category.to_string(),
                stats: compute_stats(&flags),
            });
        }
        Ok(out)
    }

    /// Upsert rows in batches, committing after each
    pub async fn persist<C: SqlClient + ?Sized>(&self, sink: &C, rows: &[BeRead]) -> PipelineResult<usize> {
        let update: Vec<String> = BEREAD_UPDATE_COLUMNS.iter().map(|c| c.to_string()).collect();
        let mut batches = 0;
        for chunk in rows.chunks(self.config.batch_size.max(1)) {
            let mut insert = Insert::new(Keyspace::BeRead.table(), BEREAD_COLUMNS)
                .on_conflict(OnConflict::Update(update.clone()))
                .stamp_on_update(BEREAD_STAMP_COLUMN);
            for row in chunk {
                insert.push_row(row.to_row()?);
            }
            let affected = sink.insert(&insert).await?;
            sink.commit().await?;
            batches += 1;
            debug!("BeRead batch {} upserted ({} affected)", batches, affected);
        }
        Ok(batches)
    }

    /// Recompute and store every article's stats, each table through its
    /// own session
    pub async fn run<F: SessionFactory + ?Sized>(&self, factory: &F) -> PipelineResult<BeReadReport> {
        let mut sessions = OpenSessions::default();
        let result = self.run_sessions(factory, &mut sessions).await;
        sessions.close_all().await;
        result
    }

    async fn run_sessions<F: SessionFactory + ?Sized>(
        &self,
        factory: &F,
        sessions: &mut OpenSessions,
    ) -> PipelineResult<BeReadReport> {
        let articles = sessions.open(factory, Keyspace::Article).await?;
        let reads = sessions.open(factory, Keyspace::Read).await?;
        let sink = sessions.open(factory, Keyspace::BeRead).await?;

        let rows = self.compute(articles.as_ref(), reads.as_ref()).await?;
        let batches = self.persist(sink.as_ref(), &rows).await?;
        let report = BeReadReport {
            articles: rows.len(),
            reads: rows.iter().map(|r| r.stats.read_num()).sum(),
            batches,
        };
        info!(
            "BeRead complete: {} articles, {} reads in {} batches",
            report.articles, report.reads, report.batches
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags(uid: &str, agree: bool, comment: bool, share: bool) -> ReadFlags {
        ReadFlags {
            uid: uid.into(),
            agree,
            comment,
            share,
        }
    }

    #[test]
    fn test_partition_keeps_order() {
        let stats = compute_stats(&[
            flags("u3", true, false, true),
            flags("u1", false, true, false),
            flags("u2", true, true, true),
        ]);
        assert_eq!(stats.read_uid_list, vec!["u3", "u1", "u2"]);
        assert_eq!(stats.comment_uid_list, vec!["u1", "u2"]);
        assert_eq!(stats.agree_uid_list, vec!["u3", "u2"]);
        assert_eq!(stats.share_uid_list, vec!["u3", "u2"]);
        assert_eq!(stats.read_num(), 3);
        assert_eq!(stats.comment_num(), 2);
    }

    #[test]
    fn test_no_reads() {
        let stats = compute_stats(&[]);
        assert_eq!(stats, ReadStats::default());
        assert_eq!(stats.share_num(), 0);
    }
}
