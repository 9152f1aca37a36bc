//! Quantile error types

use crate::model::Season;
use thiserror::Error;

/// Errors that can occur while fitting estimators or building submissions
#[derive(Error, Debug)]
pub enum QuantileError {
    /// Not enough samples to fit or calibrate
    #[error("Insufficient data: need at least {required} samples, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    /// Invalid parameter value
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    /// Season has no fitted dispersion
    #[error("No dispersion fitted for season '{0}'")]
    UnknownSeason(Season),

    /// Submission row violates the hub contract
    #[error("Invalid submission field '{field}': {reason}")]
    Validation { field: &'static str, reason: String },

    /// Numerical computation error
    #[error("Numerical error: {0}")]
    NumericalError(String),

    /// I/O failure while writing a submission
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV serialization failure
    #[error("CSV error: {0}")]
    Csv(String),
}

impl QuantileError {
    /// Shorthand for a validation failure on `field`.
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        QuantileError::Validation {
            field,
            reason: reason.into(),
        }
    }

    /// Shorthand for an invalid parameter.
    pub fn invalid_parameter(name: impl Into<String>, reason: impl Into<String>) -> Self {
        QuantileError::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
