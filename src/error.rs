//! Caller-visible error type
//!
//! Only malformed or out-of-range input surfaces as an error. Missing
//! parameters, unknown regions/seasons/crops and an untrained yield model are
//! all handled internally.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("parameter '{parameter}' = {value} is out of domain: {reason}")]
    OutOfDomain {
        parameter: String,
        value: f64,
        reason: String,
    },

    #[error("parameter '{parameter}' supplied twice with different values ({first} and {second})")]
    ConflictingInput {
        parameter: String,
        first: f64,
        second: f64,
    },

    #[error("invalid ideal range for '{parameter}': min {min} > max {max} or non-finite bound")]
    InvalidIdealRange {
        parameter: String,
        min: f64,
        max: f64,
    },

    #[error("unknown risk level '{0}'")]
    InvalidRiskBand(String),

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("yield model training failed: {0}")]
    Training(String),

    #[error("training data error: {0}")]
    Data(#[from] polars::error::PolarsError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ScoringError {
    pub fn out_of_domain(parameter: impl Into<String>, value: f64, reason: impl Into<String>) -> Self {
        ScoringError::OutOfDomain {
            parameter: parameter.into(),
            value,
            reason: reason.into(),
        }
    }
}

pub type ScoringResult<T> = std::result::Result<T, ScoringError>;
