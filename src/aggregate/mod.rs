//! Derived tables computed from the seeded data

pub mod beread;
pub mod bucket;
pub mod rank;

pub use beread::{compute_stats, BeReadReport, ReadFlags, StatsAggregator};
pub use rank::{ArticleScore, PopularityRanker};
