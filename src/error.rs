//! Error types raised by the pipeline stages.
//!
//! Every variant except [`PipelineError::MissingColumn`] and
//! [`PipelineError::Parse`] marks a broken statistical or structural invariant.
//! Those are fatal: the caller must stop before persisting anything.

use thiserror::Error;

/// Errors produced by the share estimator, normalizer, imputer, aggregator
/// and reshaper.
#[derive(Debug, Error, PartialEq)]
pub enum PipelineError {
    /// Record counts or group coverage do not match the 12 age/sex groups.
    #[error("shape error: {0}")]
    Shape(String),

    /// A population total that must be positive is not, or a join key is
    /// ambiguous.
    #[error("data error: {0}")]
    Data(String),

    /// A computed population fraction fell outside [0, 1].
    #[error("range error: fraction {fraction} for {country} {year} is outside [0, 1]")]
    Range {
        country: String,
        year: i32,
        fraction: f64,
    },

    /// Average age/sex shares do not sum close enough to 1.0.
    #[error("consistency error: age/sex shares sum to {total}, expected within [{lower}, {upper}]")]
    Consistency { total: f64, lower: f64, upper: f64 },

    /// A required column is absent from an input table.
    #[error("required column '{column}' not found in {table}")]
    MissingColumn { column: String, table: String },

    /// A cell or header could not be parsed.
    #[error("failed to parse {what} '{value}'")]
    Parse { what: String, value: String },
}

impl PipelineError {
    pub fn parse(what: impl Into<String>, value: impl Into<String>) -> Self {
        PipelineError::Parse {
            what: what.into(),
            value: value.into(),
        }
    }
}

pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
