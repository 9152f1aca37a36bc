//! Quantile Facade
//!
//! High-level API for turning point forecasts into probabilistic hub
//! submissions. Re-exports all public types from the quantile stack for
//! convenient usage.

// Re-export everything from API (which includes SPI and core)
pub use quantile_api::*;

// Explicit re-exports for documentation
pub use quantile_api::prelude;

// Re-export core modules for direct access
pub use quantile_core::{
    calendar, calibration, estimator, minimize, normality, pipeline, registry, transform, trend,
    validity, writer,
};

// Re-export SPI traits
pub use quantile_spi::{CumulativeDistribution, QuantileEstimator, ScalarMinimizer};
