//! Trait for residual-based quantile estimators

use crate::contract::CumulativeDistribution;
use crate::error::Result;
use crate::model::{ResidualSample, Season};

/// Predictive distribution fitted from historical forecast errors.
pub trait QuantileEstimator: CumulativeDistribution {
    /// Fit the estimator to historical residual samples.
    fn fit(&mut self, samples: &[ResidualSample]) -> Result<()>;

    /// Predictive quantiles at `levels`, in the same order as `levels`.
    fn quantiles(&self, levels: &[f64], point_forecast: f64, season: Season) -> Result<Vec<f64>>;

    /// Check if the estimator has been fitted.
    fn is_fitted(&self) -> bool;
}
