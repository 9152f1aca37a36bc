//! Quantile Core
//!
//! Core implementations for seasonal quantile estimation: power-transform
//! calibration, per-season residual dispersion, rate-change probabilities
//! and the hub submission contract.

pub mod calendar;
pub mod calibration;
pub mod estimator;
pub mod minimize;
pub mod normality;
pub mod pipeline;
pub mod registry;
pub mod transform;
pub mod trend;
pub mod validity;
pub mod writer;

// Re-export SPI traits for implementations
pub use quantile_spi::{
    CumulativeDistribution, EstimatorKey, LastObservation, LocationInfo, OutputType, OutputTypeId,
    PointForecast, QuantileError, QuantileEstimator, RateThreshold, RateThresholdTable,
    ResidualSample, Result, RowStatus, ScalarMinimizer, ScalarMinimum, Season, SeasonFlags,
    SubmissionRow, TargetType, TrendCategory, TrendProbabilities,
};

// Re-export main types
pub use calendar::{mmwr_week, season_flags};
pub use calibration::{calibrate_power, Calibration, PowerCalibrator};
pub use estimator::{SeasonalDispersion, SeasonalNormalQuantiles};
pub use minimize::BoundedBrent;
pub use normality::ShapiroWilk;
pub use pipeline::{PipelineSummary, SubmissionPipeline};
pub use registry::{build_registry, build_registry_with, EstimatorRegistry};
pub use transform::Transform;
pub use trend::{trend_from_deltas, trend_probabilities, TrendDeltas};
pub use validity::{
    format_quantile, is_hub_quantile, validate_row, SubmissionWindow, QUANTILE_LEVELS,
};
pub use writer::SubmissionWriter;
