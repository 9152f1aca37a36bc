//! Per (location, horizon) estimator registry

use crate::calibration::PowerCalibrator;
use crate::estimator::SeasonalNormalQuantiles;
use quantile_spi::{EstimatorKey, ResidualSample, Result, ScalarMinimizer};
use rayon::prelude::*;
use std::collections::{BTreeSet, HashMap};

/// Read-only map from (location, horizon) to a fitted estimator.
///
/// Pairs without enough history have no entry; callers skip those rows.
#[derive(Debug, Clone, Default)]
pub struct EstimatorRegistry {
    estimators: HashMap<EstimatorKey, SeasonalNormalQuantiles>,
}

impl EstimatorRegistry {
    /// Build one estimator for every (location, horizon) pair with history,
    /// using the default power calibrator.
    pub fn build(locations: &[String], horizons: &[i32], training: &[ResidualSample]) -> Self {
        Self::build_with(&PowerCalibrator::new(), locations, horizons, training)
    }

    /// Build with a custom calibrator.
    pub fn build_with<M: ScalarMinimizer>(
        calibrator: &PowerCalibrator<M>,
        locations: &[String],
        horizons: &[i32],
        training: &[ResidualSample],
    ) -> Self {
        let mut groups: HashMap<EstimatorKey, Vec<ResidualSample>> = HashMap::new();
        for sample in training {
            groups
                .entry(EstimatorKey::new(sample.location.clone(), sample.horizon))
                .or_default()
                .push(sample.clone());
        }

        let keys: Vec<EstimatorKey> = locations
            .iter()
            .flat_map(|loc| horizons.iter().map(move |&h| EstimatorKey::new(loc.clone(), h)))
            .collect();

        let estimators: HashMap<EstimatorKey, SeasonalNormalQuantiles> = keys
            .into_par_iter()
            .filter_map(|key| {
                let samples = groups.get(&key)?;
                match fit_group(calibrator, samples) {
                    Ok(estimator) => Some((key, estimator)),
                    Err(e) => {
                        tracing::warn!(key = %key, error = %e, "skipping estimator");
                        None
                    }
                }
            })
            .collect();

        tracing::info!(
            estimators = estimators.len(),
            samples = training.len(),
            "built quantile estimator registry"
        );
        Self { estimators }
    }

    /// Estimator for the pair, or `None` when there was no usable history.
    pub fn lookup(&self, location: &str, horizon: i32) -> Option<&SeasonalNormalQuantiles> {
        self.estimators.get(&EstimatorKey::new(location, horizon))
    }

    pub fn len(&self) -> usize {
        self.estimators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.estimators.is_empty()
    }

    /// Keys in sorted order.
    pub fn keys(&self) -> Vec<&EstimatorKey> {
        let mut keys: Vec<&EstimatorKey> = self.estimators.keys().collect();
        keys.sort();
        keys
    }

    pub fn iter(&self) -> impl Iterator<Item = (&EstimatorKey, &SeasonalNormalQuantiles)> {
        self.estimators.iter()
    }
}

/// Calibrate the power exponent for one group, then fit its dispersion.
fn fit_group<M: ScalarMinimizer>(
    calibrator: &PowerCalibrator<M>,
    samples: &[ResidualSample],
) -> Result<SeasonalNormalQuantiles> {
    let (forecasts, truths): (Vec<f64>, Vec<f64>) = samples
        .iter()
        .filter_map(|s| s.observed().map(|truth| (s.forecast, truth)))
        .unzip();

    let calibration = calibrator.calibrate(&forecasts, &truths)?;
    if !calibration.converged {
        tracing::warn!(
            location = %samples[0].location,
            horizon = samples[0].horizon,
            exponent = calibration.exponent,
            evaluations = calibration.evaluations,
            "power calibration hit the evaluation cap"
        );
    }
    SeasonalNormalQuantiles::fitted(calibration.transform(), samples)
}

/// Build a registry over every location and horizon present in `training`.
pub fn build_registry(training: &[ResidualSample]) -> EstimatorRegistry {
    build_registry_with(&PowerCalibrator::new(), training)
}

/// [`build_registry`] with a custom calibrator.
pub fn build_registry_with<M: ScalarMinimizer>(
    calibrator: &PowerCalibrator<M>,
    training: &[ResidualSample],
) -> EstimatorRegistry {
    let locations: Vec<String> = training
        .iter()
        .map(|s| s.location.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let horizons: Vec<i32> = training
        .iter()
        .map(|s| s.horizon)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    EstimatorRegistry::build_with(calibrator, &locations, &horizons, training)
}

#[cfg(test)]
mod tests {
    use super::*;
    use quantile_spi::{QuantileEstimator, Season, SeasonFlags};

    fn history(location: &str, horizon: i32, n: usize) -> Vec<ResidualSample> {
        (0..n)
            .map(|i| {
                let forecast = 80.0 + (i % 5) as f64 * 30.0;
                let wobble = ((i * 37 % 11) as f64 - 5.0) * 4.0;
                let seasons = match i % 3 {
                    0 => SeasonFlags::new(true, false, false),
                    1 => SeasonFlags::new(false, true, false),
                    _ => SeasonFlags::new(false, false, true),
                };
                ResidualSample::new(location, horizon, forecast, Some(forecast + wobble), seasons)
            })
            .collect()
    }

    #[test]
    fn test_build_registry_covers_pairs() {
        let mut training = history("Ohio", 1, 30);
        training.extend(history("Ohio", 2, 30));
        training.extend(history("Utah", 1, 30));

        let registry = build_registry(&training);
        assert_eq!(registry.len(), 3);
        assert!(registry.lookup("Ohio", 1).is_some());
        assert!(registry.lookup("Ohio", 2).is_some());
        assert!(registry.lookup("Utah", 1).is_some());
        // Utah has no horizon 2 history
        assert!(registry.lookup("Utah", 2).is_none());
        assert!(registry.lookup("Iowa", 1).is_none());
    }

    #[test]
    fn test_estimators_use_calibrated_power() {
        let registry = build_registry(&history("Ohio", 3, 40));
        let est = registry.lookup("Ohio", 3).unwrap();
        let a = est.transform().exponent().unwrap();
        assert!((0.2..=0.99).contains(&a));
        assert!(est.is_fitted());
        assert!(est.std_dev(Season::Overall).unwrap() > 0.0);
        assert!(est.std_dev(Season::Spring).is_ok());
    }

    #[test]
    fn test_small_groups_skipped() {
        let mut training = history("Ohio", 1, 2);
        training.extend(history("Utah", 1, 10));
        let registry = build_registry(&training);
        assert!(registry.lookup("Ohio", 1).is_none());
        assert!(registry.lookup("Utah", 1).is_some());
    }

    #[test]
    fn test_groups_without_truth_skipped() {
        let training: Vec<ResidualSample> = history("Ohio", 1, 10)
            .into_iter()
            .map(|mut s| {
                s.truth = None;
                s
            })
            .collect();
        assert!(build_registry(&training).is_empty());
    }

    #[test]
    fn test_build_respects_requested_pairs() {
        let mut training = history("Ohio", 1, 20);
        training.extend(history("Utah", 1, 20));
        let registry = EstimatorRegistry::build(&["Utah".to_string()], &[1, 2], &training);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.keys(), vec![&EstimatorKey::new("Utah", 1)]);
    }

    #[test]
    fn test_build_is_deterministic() {
        let mut training = history("Ohio", 1, 25);
        training.extend(history("Utah", 0, 25));
        let a = build_registry(&training);
        let b = build_registry(&training);
        for (key, est) in a.iter() {
            assert_eq!(Some(est), b.lookup(&key.location, key.horizon));
        }
    }

    #[test]
    fn test_capped_calibration_still_builds() {
        let calibrator =
            PowerCalibrator::with_minimizer(crate::BoundedBrent::new().with_max_evaluations(2));
        let training = history("Ohio", 2, 30);
        let forecasts: Vec<f64> = training.iter().map(|s| s.forecast).collect();
        let truths: Vec<f64> = training.iter().filter_map(|s| s.truth).collect();
        assert!(!calibrator.calibrate(&forecasts, &truths).unwrap().converged);

        let registry = build_registry_with(&calibrator, &training);
        let est = registry.lookup("Ohio", 2).unwrap();
        let a = est.transform().exponent().unwrap();
        assert!((0.2..=0.99).contains(&a));
        assert!(est.std_dev(Season::Overall).unwrap() > 0.0);
    }

    #[test]
    fn test_empty_registry() {
        let registry = build_registry(&[]);
        assert!(registry.is_empty());
        assert!(registry.keys().is_empty());
    }
}
