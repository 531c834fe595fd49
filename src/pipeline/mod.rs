//! Seed pipeline: generate users, articles and reads and bulk-load them
//!
//! Phases run strictly in order. The read session is opened (and the read
//! table optionally truncated) first, then users are loaded, then articles,
//! then reads. Users and articles are fully committed before the first read
//! is generated, so every read references an entity that already exists.
//!
//! Read generation can run on a blocking worker that hands batches to the
//! single inserter through a bounded channel. Batches still arrive in id
//! order, so the read table is always filled monotonically.

pub mod batch;
pub mod maintenance;
pub mod session;

pub use batch::Batches;
pub use maintenance::{optimize_session, restore_session, truncate_table};
pub use session::{MySqlSessions, Session, SessionFactory};

use helvetia_sql::SqlClient;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::config::{RetryPolicy, SeedConfig};
use crate::error::{PipelineError, PipelineResult};
use crate::generate::referential::{FALLBACK_LANGUAGE, FALLBACK_REGION};
use crate::generate::{
    stream_rng, ArticleGenerator, Distributions, ReadGenerator, RecordSource, ReferentialIndex,
    UserGenerator,
};
use crate::insert::{flush_batch, BulkInsert};
use crate::model::Read;
use crate::schema::Keyspace;
use session::OpenSessions;

const USER_STREAM: u64 = 0;
const ARTICLE_STREAM: u64 = 1;
const READ_STREAM: u64 = 2;

/// What one seed run produced
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub users: usize,
    pub articles: usize,
    pub reads: usize,
    pub user_batches: usize,
    pub article_batches: usize,
    pub read_batches: usize,
    /// Read candidates tried, accepted or not
    pub read_candidates: usize,
    /// Affected rows reported for read inserts. Lower than `reads` when
    /// duplicate `(uid, aid)` pairs were dropped.
    pub reads_affected: u64,
    /// Rows removed by truncation, all tables
    pub truncated: u64,
    /// Reads whose user or article was missing from the referential index
    pub referential_fallbacks: u64,
}

/// Counters from the read phase
#[derive(Default)]
struct ReadOutcome {
    accepted: usize,
    batches: usize,
    candidates: usize,
    affected: u64,
    fallbacks: u64,
}

pub struct SeedPipeline {
    config: SeedConfig,
    retry: RetryPolicy,
}

impl SeedPipeline {
    pub fn new(config: SeedConfig, retry: RetryPolicy) -> Self {
        Self { config, retry }
    }

    pub fn config(&self) -> &SeedConfig {
        &self.config
    }

    /// Run every phase against sessions from `factory`.
    ///
    /// With `dry_run` set no session is opened. On error every session
    /// opened so far is closed before the error is returned; batches already
    /// committed stay committed.
    pub async fn run<F: SessionFactory + ?Sized>(&self, factory: &F) -> PipelineResult<SeedReport> {
        if self.config.dry_run {
            return self.dry_run();
        }

        let mut sessions = OpenSessions::default();
        let result = self.run_phases(factory, &mut sessions).await;
        sessions.close_all().await;
        result
    }

    async fn run_phases<F: SessionFactory + ?Sized>(
        &self,
        factory: &F,
        sessions: &mut OpenSessions,
    ) -> PipelineResult<SeedReport> {
        let cfg = &self.config;
        let mut report = SeedReport::default();

        let read_session = sessions.open(factory, Keyspace::Read).await?;
        optimize_session(read_session.as_ref(), true).await;
        if cfg.truncate {
            report.truncated +=
                truncate_table(read_session.as_ref(), &Keyspace::Read.table(), &self.retry).await?;
        }

        let index = if cfg.reads_only {
            ReferentialIndex::load(read_session.as_ref()).await?
        } else {
            let dists = Distributions::standard()?;
            let mut index = ReferentialIndex::new();

            let session = sessions.open(factory, Keyspace::User).await?;
            let users = UserGenerator::new(
                stream_rng(cfg.rng_seed, USER_STREAM),
                dists.clone(),
                cfg.base_time,
                &mut index,
            );
            let (count, batches, truncated) = self
                .load_table(session.as_ref(), users, cfg.users, cfg.user_batch_size)
                .await?;
            report.users = count;
            report.user_batches = batches;
            report.truncated += truncated;
            sessions.close(Keyspace::User).await;

            let session = sessions.open(factory, Keyspace::Article).await?;
            let articles = ArticleGenerator::new(
                stream_rng(cfg.rng_seed, ARTICLE_STREAM),
                dists,
                cfg.base_time,
                cfg.articles,
                cfg.spread_days,
                cfg.articles_with_video,
                &mut index,
            );
            let (count, batches, truncated) = self
                .load_table(session.as_ref(), articles, cfg.articles, cfg.article_batch_size)
                .await?;
            report.articles = count;
            report.article_batches = batches;
            report.truncated += truncated;
            sessions.close(Keyspace::Article).await;

            index
        };

        let outcome = self.load_reads(&read_session, index).await?;
        restore_session(read_session.as_ref()).await;
        report.reads = outcome.accepted;
        report.read_batches = outcome.batches;
        report.read_candidates = outcome.candidates;
        report.reads_affected = outcome.affected;
        report.referential_fallbacks = outcome.fallbacks;

        info!(
            "Seed complete: {} users, {} articles, {} reads ({} candidates)",
            report.users, report.articles, report.reads, report.read_candidates
        );
        Ok(report)
    }

    /// Truncate (if configured), optimise, insert every batch with a commit,
    /// restore. Returns accepted count, batch count and rows truncated.
    async fn load_table<S>(
        &self,
        session: &dyn SqlClient,
        source: S,
        target: usize,
        batch_size: usize,
    ) -> PipelineResult<(usize, usize, u64)>
    where
        S: RecordSource + Send,
        S::Record: BulkInsert,
    {
        let keyspace = <S::Record as BulkInsert>::KEYSPACE;
        let mut truncated = 0;
        if self.config.truncate {
            truncated = truncate_table(session, &keyspace.table(), &self.retry).await?;
        }
        optimize_session(session, false).await;

        let total_batches = target.div_ceil(batch_size.max(1));
        let mut batches = Batches::new(source, target, batch_size);
        let mut done = 0;
        for batch in batches.by_ref() {
            flush_batch(session, &batch).await?;
            done += 1;
            info!(
                "Inserted {} batch {}/{} ({} rows)",
                keyspace.table_name(),
                done,
                total_batches,
                batch.len()
            );
        }

        restore_session(session).await;
        Ok((batches.accepted(), done, truncated))
    }

    /// Fails when reads are requested but there is no user or no article to
    /// draw them from
    fn read_generator(&self, index: Arc<ReferentialIndex>) -> PipelineResult<ReadGenerator> {
        let cfg = &self.config;
        let (users, articles) = if cfg.reads_only {
            (index.user_count(), index.article_count())
        } else {
            (cfg.users, cfg.articles)
        };
        if cfg.reads > 0 && (users == 0 || articles == 0) {
            return Err(PipelineError::Config(format!(
                "{} reads requested but only {} users and {} articles are available",
                cfg.reads, users, articles
            )));
        }
        Ok(ReadGenerator::new(
            stream_rng(cfg.rng_seed, READ_STREAM),
            cfg.base_time,
            users,
            articles,
            cfg.reads,
            cfg.spread_days,
            index,
        ))
    }

    async fn load_reads(&self, session: &Session, index: ReferentialIndex) -> PipelineResult<ReadOutcome> {
        let cfg = &self.config;
        let generator = self.read_generator(Arc::new(index))?;
        let total_batches = cfg.reads.div_ceil(cfg.read_batch_size.max(1));

        let outcome = if cfg.read_queue_depth == 0 {
            let mut outcome = ReadOutcome::default();
            let mut batches = Batches::new(generator, cfg.reads, cfg.read_batch_size);
            for batch in batches.by_ref() {
                outcome.record_batch(session.as_ref(), &batch, total_batches).await?;
            }
            outcome.candidates = batches.candidates();
            outcome.fallbacks = batches.source().fallbacks();
            outcome
        } else {
            self.load_reads_queued(session, generator, total_batches).await?
        };

        if outcome.fallbacks > 0 {
            warn!(
                "{} reads referenced a user or article missing from the index and used ({}, {})",
                outcome.fallbacks, FALLBACK_REGION, FALLBACK_LANGUAGE
            );
        }
        Ok(outcome)
    }

    /// Generate on a blocking worker, insert here. The channel bounds how
    /// far generation can run ahead of insertion.
    async fn load_reads_queued(
        &self,
        session: &Session,
        generator: ReadGenerator,
        total_batches: usize,
    ) -> PipelineResult<ReadOutcome> {
        let cfg = &self.config;
        let (tx, mut rx) = mpsc::channel::<Vec<Read>>(cfg.read_queue_depth);
        let (target, batch_size) = (cfg.reads, cfg.read_batch_size);

        let producer = tokio::task::spawn_blocking(move || {
            let mut batches = Batches::new(generator, target, batch_size);
            for batch in batches.by_ref() {
                // Receiver gone means the inserter failed; stop generating
                if tx.blocking_send(batch).is_err() {
                    break;
                }
            }
            (batches.candidates(), batches.source().fallbacks())
        });

        let mut outcome = ReadOutcome::default();
        let mut inserted = Ok(());
        while let Some(batch) = rx.recv().await {
            if let Err(e) = outcome.record_batch(session.as_ref(), &batch, total_batches).await {
                inserted = Err(e);
                break;
            }
        }
        drop(rx);

        let joined = producer.await;
        inserted?;
        let (candidates, fallbacks) = joined.map_err(|e| PipelineError::Task(e.to_string()))?;
        outcome.candidates = candidates;
        outcome.fallbacks = fallbacks;
        Ok(outcome)
    }

    /// Generate every batch without touching a store
    pub fn dry_run(&self) -> PipelineResult<SeedReport> {
        let cfg = &self.config;
        if cfg.reads_only {
            return Err(PipelineError::Config(
                "a reads-only run needs the store to rebuild the referential index".into(),
            ));
        }
        let dists = Distributions::standard()?;
        let mut index = ReferentialIndex::new();
        let mut report = SeedReport::default();

        let users = UserGenerator::new(
            stream_rng(cfg.rng_seed, USER_STREAM),
            dists.clone(),
            cfg.base_time,
            &mut index,
        );
        let mut batches = Batches::new(users, cfg.users, cfg.user_batch_size);
        report.user_batches = batches.by_ref().count();
        report.users = batches.accepted();

        let articles = ArticleGenerator::new(
            stream_rng(cfg.rng_seed, ARTICLE_STREAM),
            dists,
            cfg.base_time,
            cfg.articles,
            cfg.spread_days,
            cfg.articles_with_video,
            &mut index,
        );
        let mut batches = Batches::new(articles, cfg.articles, cfg.article_batch_size);
        report.article_batches = batches.by_ref().count();
        report.articles = batches.accepted();

        let reads = self.read_generator(Arc::new(index))?;
        let mut batches = Batches::new(reads, cfg.reads, cfg.read_batch_size);
        report.read_batches = batches.by_ref().count();
        report.reads = batches.accepted();
        report.read_candidates = batches.candidates();
        report.referential_fallbacks = batches.source().fallbacks();

        info!(
            "Dry run: {} user, {} article and {} read batches generated",
            report.user_batches, report.article_batches, report.read_batches
        );
        Ok(report)
    }
}

impl ReadOutcome {
    async fn record_batch(
        &mut self,
        session: &dyn SqlClient,
        batch: &[Read],
        total_batches: usize,
    ) -> PipelineResult<()> {
        self.affected += flush_batch(session, batch).await?;
        self.accepted += batch.len();
        self.batches += 1;
        info!(
            "Inserted read batch {}/{} ({} rows, {} accepted so far)",
            self.batches,
            total_batches,
            batch.len(),
            self.accepted
        );
        Ok(())
    }
}
