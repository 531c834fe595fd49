//! Pipeline error types

use helvetia_sql::SqlError;
use thiserror::Error;

/// Errors surfaced by the seeding and aggregation pipelines
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Insert, fetch or session failure from the store
    #[error("SQL error: {0}")]
    Sql(#[from] SqlError),

    /// JSON list column could not be encoded or decoded
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A weight vector could not be turned into a distribution
    #[error("Invalid distribution: {0}")]
    Distribution(#[from] rand::distributions::WeightedError),

    /// A stored value did not match any known enumeration member
    #[error("Unknown {kind} value: {value}")]
    UnknownValue { kind: &'static str, value: String },

    /// A fetched row was missing a required column
    #[error("Missing column {column} in {table}")]
    MissingColumn { table: String, column: String },

    /// Configuration file or value problem
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A background generation task failed
    #[error("Generation task failed: {0}")]
    Task(String),
}

pub type PipelineResult<T> = Result<T, PipelineError>;
