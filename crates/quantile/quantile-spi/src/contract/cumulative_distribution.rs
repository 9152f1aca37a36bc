//! Trait for predictive CDF evaluation

use crate::error::Result;
use crate::model::Season;

/// Predictive cumulative distribution anchored at a point forecast.
///
/// Trend derivation only needs this view of an estimator, which lets it run
/// against fixed probability tables as well as fitted models.
pub trait CumulativeDistribution: Send + Sync {
    /// Probability that the target is at or below `value` given `point_forecast`.
    fn cdf(&self, value: f64, point_forecast: f64, season: Season) -> Result<f64>;
}
