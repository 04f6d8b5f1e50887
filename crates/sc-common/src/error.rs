//! Error types for Scorecard.
//!
//! The taxonomy mirrors how callers must react:
//! - Missing resources are surfaced as `None` by optional reads and as
//!   `MissingScores` when a model has no usable data at all.
//! - Data-integrity violations (duplicate ids, mismatched id sets) are fatal
//!   for that model and never recovered locally.
//! - Numeric-domain problems come from `sc-math` and wrap its errors.
//! - Storage failures propagate as plain I/O errors; retries belong to the
//!   storage backend, not here.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for Scorecard operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error categories for grouping related errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Configuration file errors.
    Config,
    /// Raw data parsing errors (headers, file shape).
    Data,
    /// Duplicate or mismatched identifiers between joined tables.
    Integrity,
    /// Numeric-domain and histogram-shape errors.
    Numeric,
    /// File I/O and serialization errors.
    Io,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Config => write!(f, "config"),
            ErrorCategory::Data => write!(f, "data"),
            ErrorCategory::Integrity => write!(f, "integrity"),
            ErrorCategory::Numeric => write!(f, "numeric"),
            ErrorCategory::Io => write!(f, "io"),
        }
    }
}

/// Unified error type for Scorecard.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file is missing required keys or carries unknown ones.
    #[error("invalid config: {0}")]
    Config(String),

    /// A scores file header is missing a required column.
    #[error("{file}: {reason}")]
    MalformedHeader { file: String, reason: String },

    /// No scores data exists for the model.
    #[error("no scores data for model '{0}'")]
    MissingScores(String),

    /// An id appeared more than once in a joined table.
    #[error("duplicate id '{id}' in {table}")]
    DuplicateId { table: String, id: String },

    /// The actuals and scores tables do not cover the same ids.
    #[error(
        "actuals and scores id sets do not match: {only_in_actuals} only in actuals, \
         {only_in_scores} only in scores"
    )]
    IdSetMismatch {
        only_in_actuals: usize,
        only_in_scores: usize,
    },

    /// Histogram shape violation (from construction or cache input).
    #[error("histogram error: {0}")]
    Histogram(#[from] sc_math::HistogramError),

    /// Metric derivation failure.
    #[error("metrics error: {0}")]
    Metrics(#[from] sc_math::MetricsError),

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML configuration parse error.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// Category for grouping and machine-readable output.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::Config(_) | Error::Yaml(_) => ErrorCategory::Config,
            Error::MalformedHeader { .. } | Error::MissingScores(_) => ErrorCategory::Data,
            Error::DuplicateId { .. } | Error::IdSetMismatch { .. } => ErrorCategory::Integrity,
            Error::Histogram(_) | Error::Metrics(_) => ErrorCategory::Numeric,
            Error::Io(_) | Error::Json(_) => ErrorCategory::Io,
        }
    }
}
