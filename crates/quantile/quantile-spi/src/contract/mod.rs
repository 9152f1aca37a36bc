//! Contract module containing trait definitions for quantile estimation

mod cumulative_distribution;
mod quantile_estimator;
mod scalar_minimizer;

pub use cumulative_distribution::CumulativeDistribution;
pub use quantile_estimator::QuantileEstimator;
pub use scalar_minimizer::ScalarMinimizer;
