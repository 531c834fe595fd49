//! Helvetia Seed
//!
//! Synthetic data seeder and aggregator for the Helvetia social-reading
//! benchmark. Users, articles and reads are generated with fixed
//! distributions, bulk-loaded into one Vitess keyspace per table, and then
//! rolled up into two derived tables: per-article engagement (BeRead) and
//! daily/weekly/monthly popularity rankings (PopularRank).
//!
//! # Architecture
//!
//! - [`generate`]: pure record generators and the referential index that
//!   ties reads to already generated users and articles
//! - [`pipeline`]: fixed-size batching, phase ordering, truncation and
//!   session tuning
//! - [`insert`]: parameterized multi-row inserts and the inline-literal fast
//!   path used for reads
//! - [`aggregate`]: the BeRead rollup and the PopularRank buckets
//!
//! All store access goes through [`helvetia_sql::SqlClient`], so every phase
//! runs unchanged against MySQL/VTGate or the in-process embedded client.
//!
//! ## Example Usage
//!
//! ```rust
//! use helvetia_seed::config::{RetryPolicy, SeedConfig};
//! use helvetia_seed::pipeline::SeedPipeline;
//! use helvetia_seed::schema::{table_specs, Keyspace};
//! use helvetia_sql::EmbeddedClient;
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = EmbeddedClient::with_tables(table_specs());
//!     let config = SeedConfig {
//!         users: 50,
//!         articles: 20,
//!         reads: 200,
//!         rng_seed: Some(1),
//!         ..SeedConfig::default()
//!     };
//!
//!     let report = SeedPipeline::new(config, RetryPolicy::default())
//!         .run(&store)
//!         .await
//!         .unwrap();
//!     assert_eq!(report.reads, 200);
//!     assert_eq!(store.row_count(&Keyspace::User.table()).await, 50);
//! }
//! ```

pub mod aggregate;
pub mod config;
pub mod error;
pub mod generate;
pub mod insert;
pub mod model;
pub mod pipeline;
pub mod schema;

pub use aggregate::{PopularityRanker, StatsAggregator};
pub use config::{BeReadConfig, PipelineConfig, RankConfig, RetryPolicy, SeedConfig};
pub use error::{PipelineError, PipelineResult};
pub use generate::ReferentialIndex;
pub use pipeline::{SeedPipeline, SeedReport, SessionFactory};
