//! Rate-change category probabilities
//!
//! Category boundaries are rate thresholds (per 100,000 people) converted to
//! counts for the location, applied around the last observed count. The
//! probability of each category is the predictive CDF mass between its
//! boundaries, so the five raw values telescope to one.

use quantile_spi::{
    CumulativeDistribution, LastObservation, QuantileError, RateThreshold, RateThresholdTable,
    Result, Season, TrendProbabilities,
};

/// Population unit the rate thresholds are expressed in.
pub const RATE_POPULATION_UNIT: f64 = 100_000.0;

/// Smallest half-width of the stable band, in counts.
pub const MIN_STABLE_DELTA: f64 = 10.0;

/// Count deltas around the last observation for one location and horizon.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendDeltas {
    pub stable: f64,
    pub increase: f64,
    /// Negative
    pub decrease: f64,
}

impl TrendDeltas {
    /// Convert rate thresholds to counts for a population.
    pub fn from_threshold(threshold: &RateThreshold, population: f64) -> Self {
        let pop_rate = population / RATE_POPULATION_UNIT;
        Self {
            stable: (threshold.stable * pop_rate).max(MIN_STABLE_DELTA),
            increase: threshold.increase * pop_rate,
            decrease: threshold.decrease * pop_rate,
        }
    }
}

/// Category probabilities from precomputed deltas.
pub fn trend_from_deltas<C: CumulativeDistribution + ?Sized>(
    cdf: &C,
    point_forecast: f64,
    last_count: f64,
    deltas: &TrendDeltas,
    season: Season,
) -> Result<TrendProbabilities> {
    let at = |value: f64| cdf.cdf(value, point_forecast, season);

    let stable_ucp = at(last_count + deltas.stable)?;
    let stable_lcp = at(last_count - deltas.stable)?;
    let increase_cp = at(last_count + deltas.increase)?;
    let decrease_cp = at(last_count + deltas.decrease)?;

    Ok(TrendProbabilities {
        large_decrease: decrease_cp,
        decrease: stable_lcp - decrease_cp,
        stable: stable_ucp - stable_lcp,
        increase: increase_cp - stable_ucp,
        large_increase: 1.0 - increase_cp,
    })
}

/// Category probabilities for a forecast at `horizon`.
///
/// The raw values always sum to one. Some may be negative when the stable
/// floor ([`MIN_STABLE_DELTA`]) exceeds the increase or decrease delta, which
/// happens for small populations. The writer clamps negatives to 0 on output,
/// so the written probabilities can then sum to more than one.
pub fn trend_probabilities<C: CumulativeDistribution + ?Sized>(
    cdf: &C,
    point_forecast: f64,
    last: &LastObservation,
    population: f64,
    horizon: i32,
    thresholds: &RateThresholdTable,
    season: Season,
) -> Result<TrendProbabilities> {
    let threshold = thresholds.get(horizon).ok_or_else(|| {
        QuantileError::invalid_parameter(
            "horizon",
            format!("no rate-change threshold configured for horizon {}", horizon),
        )
    })?;
    let deltas = TrendDeltas::from_threshold(threshold, population);
    trend_from_deltas(cdf, point_forecast, last.count, &deltas, season)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimator::SeasonalNormalQuantiles;
    use crate::transform::Transform;
    use quantile_spi::{QuantileEstimator, ResidualSample, SeasonFlags, TrendCategory};

    /// Step CDF taking fixed values at the four category boundaries.
    struct BoundaryCdf;

    impl CumulativeDistribution for BoundaryCdf {
        fn cdf(&self, value: f64, _point_forecast: f64, _season: Season) -> Result<f64> {
            Ok(if value < 85.0 {
                0.10
            } else if value < 100.0 {
                0.40
            } else if value < 115.0 {
                0.80
            } else {
                0.95
            })
        }
    }

    fn fitted_estimator() -> SeasonalNormalQuantiles {
        let samples: Vec<ResidualSample> = (0..30)
            .map(|i| {
                let forecast = 200.0 + i as f64;
                let truth = forecast + ((i * 7 % 13) as f64 - 6.0) * 5.0;
                ResidualSample::new("Ohio", 2, forecast, Some(truth), SeasonFlags::default())
            })
            .collect();
        let mut est = SeasonalNormalQuantiles::new(Transform::Identity);
        est.fit(&samples).unwrap();
        est
    }

    #[test]
    fn test_fixed_cdf_probabilities() {
        let deltas = TrendDeltas {
            stable: 10.0,
            increase: 20.0,
            decrease: -20.0,
        };
        let probs = trend_from_deltas(&BoundaryCdf, 100.0, 100.0, &deltas, Season::Fall).unwrap();

        assert!((probs.large_decrease - 0.10).abs() < 1e-12);
        assert!((probs.decrease - 0.30).abs() < 1e-12);
        assert!((probs.stable - 0.40).abs() < 1e-12);
        assert!((probs.increase - 0.15).abs() < 1e-12);
        assert!((probs.large_increase - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_stable_delta_floor() {
        // 2.0 per 100k over 400k people is 8 counts
        let deltas = TrendDeltas::from_threshold(&RateThreshold::new(2.0, 4.0, -4.0), 400_000.0);
        assert_eq!(deltas.stable, MIN_STABLE_DELTA);
        assert!((deltas.increase - 16.0).abs() < 1e-12);
        assert!((deltas.decrease + 16.0).abs() < 1e-12);
    }

    #[test]
    fn test_large_population_deltas() {
        let deltas = TrendDeltas::from_threshold(&RateThreshold::new(2.5, 5.0, -5.0), 12_000_000.0);
        assert!((deltas.stable - 300.0).abs() < 1e-9);
        assert!((deltas.increase - 600.0).abs() < 1e-9);
        assert!((deltas.decrease + 600.0).abs() < 1e-9);
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let est = fitted_estimator();
        let last = LastObservation::new(190.0, 1.6);
        let table = RateThresholdTable::default();
        for horizon in table.horizons() {
            for point in [120.0, 190.0, 260.0] {
                let probs = trend_probabilities(
                    &est,
                    point,
                    &last,
                    11_800_000.0,
                    horizon,
                    &table,
                    Season::Overall,
                )
                .unwrap();
                assert!((probs.sum() - 1.0).abs() < 1e-9);
                for (_, p) in probs.iter() {
                    assert!((-1e-12..=1.0 + 1e-12).contains(&p));
                }
            }
        }
    }

    #[test]
    fn test_forecast_above_last_favours_increase() {
        let est = fitted_estimator();
        let last = LastObservation::new(100.0, 1.0);
        let table = RateThresholdTable::default();
        let probs = trend_probabilities(&est, 400.0, &last, 1_000_000.0, 1, &table, Season::Overall)
            .unwrap();
        assert!(probs.get(TrendCategory::LargeIncrease) > 0.99);
        assert!(probs.get(TrendCategory::LargeDecrease) < 0.01);
    }

    /// Uniform CDF on [50, 150].
    struct UniformCdf;

    impl CumulativeDistribution for UniformCdf {
        fn cdf(&self, value: f64, _point_forecast: f64, _season: Season) -> Result<f64> {
            Ok(((value - 50.0) / 100.0).clamp(0.0, 1.0))
        }
    }

    #[test]
    fn test_stable_floor_overlap_on_small_population() {
        // 1.0 per 100k over 200k people is 2 counts, floored to 10
        let deltas = TrendDeltas::from_threshold(&RateThreshold::new(1.0, 2.0, -2.0), 200_000.0);
        assert!(deltas.stable > deltas.increase);

        let probs = trend_from_deltas(&UniformCdf, 100.0, 100.0, &deltas, Season::Fall).unwrap();
        assert!((probs.sum() - 1.0).abs() < 1e-12);
        assert!((probs.increase + 0.06).abs() < 1e-12);
        assert!((probs.decrease + 0.06).abs() < 1e-12);

        let clamped: f64 = probs.iter().map(|(_, p)| p.max(0.0)).sum();
        assert!((clamped - 1.12).abs() < 1e-12);
    }

    #[test]
    fn test_missing_horizon_rejected() {
        let est = fitted_estimator();
        let last = LastObservation::new(100.0, 1.0);
        let err = trend_probabilities(
            &est,
            100.0,
            &last,
            1_000_000.0,
            7,
            &RateThresholdTable::default(),
            Season::Overall,
        )
        .unwrap_err();
        assert!(matches!(err, QuantileError::InvalidParameter { .. }));
    }
}
