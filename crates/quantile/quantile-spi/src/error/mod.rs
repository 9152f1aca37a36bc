//! Error module containing error types and result aliases

mod quantile_error;

pub use quantile_error::QuantileError;

/// Result type for quantile estimation and submission operations
pub type Result<T> = std::result::Result<T, QuantileError>;
