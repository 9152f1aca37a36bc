//! Power transform calibration
//!
//! Picks the exponent `a` whose transformed residuals look most Gaussian,
//! scored by the Shapiro-Wilk p-value.

use crate::minimize::BoundedBrent;
use crate::normality::{ShapiroWilk, MIN_SAMPLES};
use crate::transform::Transform;
use quantile_spi::{QuantileError, Result, ScalarMinimizer};

/// Smallest exponent searched. Exponents near zero give very wide intervals.
pub const MIN_EXPONENT: f64 = 0.2;
/// Largest exponent searched.
pub const MAX_EXPONENT: f64 = 0.99;

/// Residuals X^a - Y^a after the +1 pseudo-count.
pub fn power_residuals(forecasts: &[f64], truths: &[f64], exponent: f64) -> Vec<f64> {
    let t = Transform::Power(exponent);
    forecasts
        .iter()
        .zip(truths)
        .map(|(&x, &y)| t.forward(x) - t.forward(y))
        .collect()
}

/// Negative Shapiro-Wilk p-value of the power residuals; lower is more normal.
///
/// Residuals the test cannot score count as maximally non-normal (0.0).
pub fn normality_score(forecasts: &[f64], truths: &[f64], exponent: f64) -> f64 {
    let residuals = power_residuals(forecasts, truths, exponent);
    match ShapiroWilk::test(&residuals) {
        Ok(result) => -result.p_value,
        Err(_) => 0.0,
    }
}

/// Outcome of calibrating one (location, horizon) group.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    pub exponent: f64,
    /// Shapiro-Wilk p-value at the chosen exponent
    pub p_value: f64,
    pub evaluations: usize,
    pub converged: bool,
}

impl Calibration {
    pub fn transform(&self) -> Transform {
        Transform::Power(self.exponent)
    }
}

/// Searches the power exponent over a bounded interval.
#[derive(Debug, Clone)]
pub struct PowerCalibrator<M: ScalarMinimizer = BoundedBrent> {
    lower: f64,
    upper: f64,
    minimizer: M,
}

impl PowerCalibrator<BoundedBrent> {
    pub fn new() -> Self {
        Self::with_minimizer(BoundedBrent::new())
    }
}

impl Default for PowerCalibrator<BoundedBrent> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: ScalarMinimizer> PowerCalibrator<M> {
    pub fn with_minimizer(minimizer: M) -> Self {
        Self {
            lower: MIN_EXPONENT,
            upper: MAX_EXPONENT,
            minimizer,
        }
    }

    /// Restrict the search to `[lower, upper]`, which must lie inside (0, 1].
    pub fn with_bounds(mut self, lower: f64, upper: f64) -> Result<Self> {
        if !(lower > 0.0 && upper <= 1.0 && lower < upper) {
            return Err(QuantileError::invalid_parameter(
                "bounds",
                format!("need 0 < lower < upper <= 1, got [{}, {}]", lower, upper),
            ));
        }
        self.lower = lower;
        self.upper = upper;
        Ok(self)
    }

    pub fn bounds(&self) -> (f64, f64) {
        (self.lower, self.upper)
    }

    /// Choose the exponent for paired `forecasts` and `truths`.
    pub fn calibrate(&self, forecasts: &[f64], truths: &[f64]) -> Result<Calibration> {
        if forecasts.len() != truths.len() {
            return Err(QuantileError::invalid_parameter(
                "truths",
                format!(
                    "expected {} values to pair with forecasts, got {}",
                    forecasts.len(),
                    truths.len()
                ),
            ));
        }
        if forecasts.len() < MIN_SAMPLES {
            return Err(QuantileError::InsufficientData {
                required: MIN_SAMPLES,
                actual: forecasts.len(),
            });
        }

        let minimum = self.minimizer.minimize(
            &mut |a| normality_score(forecasts, truths, a),
            self.lower,
            self.upper,
        );
        let exponent = minimum.x.clamp(self.lower, self.upper);

        Ok(Calibration {
            exponent,
            p_value: -minimum.fun,
            evaluations: minimum.evaluations,
            converged: minimum.converged,
        })
    }
}

/// Calibrate the power exponent with the default search interval.
pub fn calibrate_power(forecasts: &[f64], truths: &[f64]) -> Result<f64> {
    PowerCalibrator::new()
        .calibrate(forecasts, truths)
        .map(|c| c.exponent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normality::standard_normal;
    use statrs::distribution::ContinuousCDF;

    /// Truths whose square roots are normal around the forecasts' square roots.
    fn sqrt_normal_pairs(n: usize) -> (Vec<f64>, Vec<f64>) {
        let normal = standard_normal().unwrap();
        let mut forecasts = Vec::with_capacity(n);
        let mut truths = Vec::with_capacity(n);
        for i in 0..n {
            let level = 50.0 + (i % 7) as f64 * 40.0;
            let z = normal.inverse_cdf((i as f64 + 0.5) / n as f64);
            let forecast_root = (level + 1.0).sqrt();
            let truth_root = forecast_root + 1.5 * z;
            forecasts.push(level);
            truths.push(truth_root.powi(2) - 1.0);
        }
        (forecasts, truths)
    }

    #[test]
    fn test_power_residuals() {
        let r = power_residuals(&[3.0, 8.0], &[0.0, 15.0], 0.5);
        assert!((r[0] - 1.0).abs() < 1e-12);
        assert!((r[1] - (3.0 - 4.0)).abs() < 1e-12);
    }

    #[test]
    fn test_normality_score_is_negative_p() {
        let (x, y) = sqrt_normal_pairs(40);
        let score = normality_score(&x, &y, 0.5);
        assert!(score < 0.0 && score >= -1.0);
    }

    #[test]
    fn test_normality_score_degenerate() {
        assert_eq!(normality_score(&[1.0], &[2.0], 0.5), 0.0);
    }

    #[test]
    fn test_calibrate_within_bounds() {
        let (x, y) = sqrt_normal_pairs(60);
        let calibration = PowerCalibrator::new().calibrate(&x, &y).unwrap();
        assert!(calibration.exponent >= MIN_EXPONENT);
        assert!(calibration.exponent <= MAX_EXPONENT);
        assert!(calibration.p_value > 0.0 && calibration.p_value <= 1.0);
        assert!(calibration.evaluations > 1);
    }

    #[test]
    fn test_calibrate_prefers_more_normal_exponent() {
        let (x, y) = sqrt_normal_pairs(60);
        let calibration = PowerCalibrator::new().calibrate(&x, &y).unwrap();
        let chosen = normality_score(&x, &y, calibration.exponent);
        // Brent is a local search; the chosen point must beat the interval edges
        assert!(chosen <= normality_score(&x, &y, MIN_EXPONENT) + 1e-9);
        assert!(chosen <= normality_score(&x, &y, MAX_EXPONENT) + 1e-9);
    }

    #[test]
    fn test_calibrate_too_few_samples() {
        let err = PowerCalibrator::new().calibrate(&[1.0, 2.0], &[1.0, 3.0]).unwrap_err();
        assert!(matches!(
            err,
            QuantileError::InsufficientData {
                required: 3,
                actual: 2
            }
        ));
    }

    #[test]
    fn test_calibrate_length_mismatch() {
        let err = calibrate_power(&[1.0, 2.0, 3.0], &[1.0]).unwrap_err();
        assert!(matches!(err, QuantileError::InvalidParameter { .. }));
    }

    #[test]
    fn test_custom_bounds() {
        let (x, y) = sqrt_normal_pairs(30);
        let calibrator = PowerCalibrator::new().with_bounds(0.4, 0.6).unwrap();
        assert_eq!(calibrator.bounds(), (0.4, 0.6));
        let a = calibrator.calibrate(&x, &y).unwrap().exponent;
        assert!((0.4..=0.6).contains(&a));
        assert!(PowerCalibrator::new().with_bounds(0.0, 0.5).is_err());
        assert!(PowerCalibrator::new().with_bounds(0.7, 0.5).is_err());
    }

    #[test]
    fn test_calibration_transform() {
        let calibration = Calibration {
            exponent: 0.35,
            p_value: 0.4,
            evaluations: 12,
            converged: true,
        };
        assert_eq!(calibration.transform(), Transform::Power(0.35));
    }
}
