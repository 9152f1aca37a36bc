//! Season-conditioned Gaussian residual model
//!
//! Residuals truth - forecast are modeled as zero-mean Gaussian on the
//! transformed scale, with one standard deviation per season plus a pooled
//! `Overall` value. Quantiles and CDF values are anchored at the transformed
//! point forecast and mapped back through the inverse transform.
//!
//! Dispersion is the population standard deviation (divide by n). This keeps
//! the historical behaviour of the submission model and is not Bessel
//! corrected on purpose; small groups therefore get slightly narrower
//! intervals than a sample statistic would give.

use crate::normality::standard_normal;
use crate::transform::Transform;
use quantile_spi::{
    CumulativeDistribution, QuantileError, QuantileEstimator, ResidualSample, Result, Season,
};
use serde::{Deserialize, Serialize};
use statrs::distribution::ContinuousCDF;
use std::collections::BTreeMap;

/// Population standard deviation; `None` for an empty slice.
pub fn population_std(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    Some(variance.sqrt())
}

/// Transformed residuals truth - forecast of the samples in `season`.
fn season_residuals(samples: &[(f64, f64, &ResidualSample)], season: Season) -> Vec<f64> {
    samples
        .iter()
        .filter(|(_, _, s)| s.seasons.contains(season))
        .map(|&(pred, target, _)| target - pred)
        .collect()
}

/// Season → residual standard deviation on the transformed scale.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeasonalDispersion {
    std_devs: BTreeMap<Season, f64>,
}

impl SeasonalDispersion {
    pub fn get(&self, season: Season) -> Option<f64> {
        self.std_devs.get(&season).copied()
    }

    pub fn contains(&self, season: Season) -> bool {
        self.std_devs.contains_key(&season)
    }

    /// Seasons with a fitted value.
    pub fn seasons(&self) -> impl Iterator<Item = Season> + '_ {
        self.std_devs.keys().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.std_devs.is_empty()
    }
}

/// Gaussian quantile estimator with per-season dispersion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalNormalQuantiles {
    transform: Transform,
    dispersion: SeasonalDispersion,
    n_samples: usize,
}

impl SeasonalNormalQuantiles {
    /// Create an unfitted estimator using `transform`.
    pub fn new(transform: Transform) -> Self {
        Self {
            transform,
            dispersion: SeasonalDispersion::default(),
            n_samples: 0,
        }
    }

    /// Create and fit in one step.
    pub fn fitted(transform: Transform, samples: &[ResidualSample]) -> Result<Self> {
        let mut estimator = Self::new(transform);
        estimator.fit(samples)?;
        Ok(estimator)
    }

    pub fn transform(&self) -> Transform {
        self.transform
    }

    pub fn dispersion(&self) -> &SeasonalDispersion {
        &self.dispersion
    }

    /// Number of samples with observed truth used in the fit.
    pub fn n_samples(&self) -> usize {
        self.n_samples
    }

    /// Fitted standard deviation for `season`.
    pub fn std_dev(&self, season: Season) -> Result<f64> {
        self.dispersion
            .get(season)
            .ok_or(QuantileError::UnknownSeason(season))
    }

    /// `season` if it was fitted, otherwise `Overall`.
    pub fn season_or_overall(&self, season: Season) -> Season {
        if self.dispersion.contains(season) {
            season
        } else {
            tracing::warn!(
                season = %season,
                "no residuals for season, falling back to Overall dispersion"
            );
            Season::Overall
        }
    }
}

impl CumulativeDistribution for SeasonalNormalQuantiles {
    fn cdf(&self, value: f64, point_forecast: f64, season: Season) -> Result<f64> {
        let sd = self.std_dev(season)?;
        let center = self.transform.forward(point_forecast);
        let x = self.transform.forward(value);

        if sd == 0.0 {
            // Point mass at the forecast
            return Ok(if x >= center { 1.0 } else { 0.0 });
        }
        Ok(standard_normal()?.cdf((x - center) / sd))
    }
}

impl QuantileEstimator for SeasonalNormalQuantiles {
    fn fit(&mut self, samples: &[ResidualSample]) -> Result<()> {
        let observed: Vec<(f64, f64, &ResidualSample)> = samples
            .iter()
            .filter_map(|s| {
                s.observed().map(|truth| {
                    (
                        self.transform.forward(s.forecast),
                        self.transform.forward(truth),
                        s,
                    )
                })
            })
            .collect();

        if observed.is_empty() {
            return Err(QuantileError::InsufficientData {
                required: 1,
                actual: 0,
            });
        }

        let mut std_devs = BTreeMap::new();
        for season in Season::CALENDAR {
            if let Some(sd) = population_std(&season_residuals(&observed, season)) {
                std_devs.insert(season, sd);
            }
        }
        if let Some(sd) = population_std(&season_residuals(&observed, Season::Overall)) {
            std_devs.insert(Season::Overall, sd);
        }

        self.dispersion = SeasonalDispersion { std_devs };
        self.n_samples = observed.len();
        Ok(())
    }

    fn quantiles(&self, levels: &[f64], point_forecast: f64, season: Season) -> Result<Vec<f64>> {
        let sd = self.std_dev(season)?;
        let normal = standard_normal()?;
        let center = self.transform.forward(point_forecast);

        levels
            .iter()
            .map(|&q| {
                if !(q > 0.0 && q < 1.0) {
                    return Err(QuantileError::invalid_parameter(
                        "quantile",
                        format!("level must be in (0, 1), got {}", q),
                    ));
                }
                Ok(self.transform.inverse(center + sd * normal.inverse_cdf(q)))
            })
            .collect()
    }

    fn is_fitted(&self) -> bool {
        !self.dispersion.is_empty()
    }
}
