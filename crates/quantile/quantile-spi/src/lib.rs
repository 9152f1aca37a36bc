//! Quantile Service Provider Interface
//!
//! Defines the contracts, data models and error types shared by the
//! seasonal quantile estimation engine and the submission tooling.

pub mod contract;
pub mod error;
pub mod model;

// Re-export all public items at crate root for convenience
pub use contract::{CumulativeDistribution, QuantileEstimator, ScalarMinimizer};
pub use error::{QuantileError, Result};
pub use model::{
    EstimatorKey, LastObservation, LocationInfo, OutputType, OutputTypeId, PointForecast,
    RateThreshold, RateThresholdTable, ResidualSample, RowStatus, ScalarMinimum, Season,
    SeasonFlags, SubmissionRow, TargetType, TrendCategory, TrendProbabilities,
};
