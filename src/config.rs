//! Pipeline configuration
//!
//! Every struct carries the defaults the benchmark has always been seeded
//! with. `PipelineConfig` can be loaded from YAML; the CLI then overrides
//! individual fields from flags.

use chrono::{NaiveDate, NaiveDateTime};
use helvetia_sql::ConnectionConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{PipelineError, PipelineResult};

pub const USERS_NUM: usize = 10_000;
pub const ARTICLES_NUM: usize = 10_000;
pub const READS_NUM: usize = 100_000;

/// Settings for generating and bulk-inserting User/Article/Read
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    pub users: usize,
    pub articles: usize,
    /// Accepted reads to produce (rejected candidates do not count)
    pub reads: usize,
    pub user_batch_size: usize,
    pub article_batch_size: usize,
    pub read_batch_size: usize,
    /// Anchor for all generated timestamps
    pub base_time: NaiveDateTime,
    /// Window articles and reads are spread over
    pub spread_days: i64,
    /// Articles with index below this get a video path
    pub articles_with_video: usize,
    /// Fixed RNG seed; `None` draws from entropy
    pub rng_seed: Option<u64>,
    /// Read batches buffered between the generator task and the inserter
    pub read_queue_depth: usize,
    pub truncate: bool,
    pub dry_run: bool,
    /// Skip user/article generation and rebuild the referential index from the store
    pub reads_only: bool,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            users: USERS_NUM,
            articles: ARTICLES_NUM,
            reads: READS_NUM,
            user_batch_size: 2000,
            article_batch_size: 1000,
            read_batch_size: 2000,
            base_time: default_base_time(),
            spread_days: 365,
            articles_with_video: 50,
            rng_seed: None,
            read_queue_depth: 4,
            truncate: false,
            dry_run: false,
            reads_only: false,
        }
    }
}

/// 2017-09-25 00:00:00
pub fn default_base_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2017, 9, 25)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default()
}

/// Settings for the BeRead rollup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeReadConfig {
    /// Rows per upsert statement
    pub batch_size: usize,
}

impl Default for BeReadConfig {
    fn default() -> Self {
        Self { batch_size: 500 }
    }
}

/// Settings for the PopularRank pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankConfig {
    /// Articles kept per bucket
    pub top_n: usize,
}

impl Default for RankConfig {
    fn default() -> Self {
        Self { top_n: 5 }
    }
}

/// Bounded retry with exponential backoff, for transient store conflicts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 20,
            initial_backoff_ms: 500,
            max_backoff_ms: 5_000,
        }
    }
}

impl RetryPolicy {
    /// Pause before retry number `attempt` (1-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u64 << attempt.saturating_sub(1).min(16);
        let ms = self.initial_backoff_ms.saturating_mul(factor).min(self.max_backoff_ms);
        Duration::from_millis(ms)
    }

    /// No waiting; for tests
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_backoff_ms: 0,
            max_backoff_ms: 0,
        }
    }
}

/// Everything the CLI can configure
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub connection: ConnectionConfig,
    pub seed: SeedConfig,
    pub beread: BeReadConfig,
    pub rank: RankConfig,
    pub retry: RetryPolicy,
}

impl PipelineConfig {
    pub fn from_yaml_str(text: &str) -> PipelineResult<Self> {
        serde_yaml::from_str(text).map_err(|e| PipelineError::Config(e.to_string()))
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> PipelineResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> PipelineResult<()> {
        let s = &self.seed;
        if s.user_batch_size == 0 || s.article_batch_size == 0 || s.read_batch_size == 0 {
            return Err(PipelineError::Config("batch sizes must be positive".into()));
        }
        if self.beread.batch_size == 0 {
            return Err(PipelineError::Config("beread batch size must be positive".into()));
        }
        if s.reads > 0 && (s.users == 0 || s.articles == 0) {
            return Err(PipelineError::Config(
                "reads need at least one user and one article".into(),
            ));
        }
        if s.spread_days <= 0 {
            return Err(PipelineError::Config("spread window must be at least one day".into()));
        }
        if self.retry.max_attempts == 0 {
            return Err(PipelineError::Config("retry policy needs at least one attempt".into()));
        }
        Ok(())
    }
}
