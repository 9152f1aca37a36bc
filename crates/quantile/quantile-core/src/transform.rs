//! Variance-stabilizing transforms
//!
//! Counts are shifted by a +1 pseudo-count before transforming so that zero
//! counts stay inside every transform's domain. Inputs outside the domain are
//! clipped to its boundary.

use quantile_spi::{QuantileError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Reversible monotonic transform applied to counts before Gaussian modeling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "exponent", rename_all = "lowercase")]
pub enum Transform {
    /// forward(x) = x
    Identity,
    /// forward(x) = ln(max(x, 0) + 1)
    Log,
    /// forward(x) = max(x + 1, 0)^a, a in (0, 1]
    Power(f64),
}

impl Transform {
    /// Power transform with exponent `a`, validated to lie in (0, 1].
    pub fn power(a: f64) -> Result<Self> {
        if !(a > 0.0 && a <= 1.0) {
            return Err(QuantileError::invalid_parameter(
                "exponent",
                format!("power exponent must be in (0, 1], got {}", a),
            ));
        }
        Ok(Transform::Power(a))
    }

    pub fn forward(&self, x: f64) -> f64 {
        match *self {
            Transform::Identity => x,
            Transform::Log => x.max(0.0).ln_1p(),
            Transform::Power(a) => (x + 1.0).max(0.0).powf(a),
        }
    }

    pub fn inverse(&self, y: f64) -> f64 {
        match *self {
            Transform::Identity => y,
            Transform::Log => y.exp_m1(),
            Transform::Power(a) => y.max(0.0).powf(1.0 / a) - 1.0,
        }
    }

    /// Apply the forward transform to every element.
    pub fn forward_all(&self, xs: &[f64]) -> Vec<f64> {
        xs.iter().map(|&x| self.forward(x)).collect()
    }

    /// Exponent of a power transform.
    pub fn exponent(&self) -> Option<f64> {
        match *self {
            Transform::Power(a) => Some(a),
            _ => None,
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Transform::Identity
    }
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transform::Identity => write!(f, "identity"),
            Transform::Log => write!(f, "log"),
            Transform::Power(a) => write!(f, "power({:.4})", a),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts() -> Vec<f64> {
        vec![0.0, 1.0, 3.5, 12.0, 150.0, 2_400.0, 31_000.0]
    }

    #[test]
    fn test_round_trip_all_transforms() {
        let transforms = [
            Transform::Identity,
            Transform::Log,
            Transform::power(0.2).unwrap(),
            Transform::power(0.57).unwrap(),
            Transform::power(1.0).unwrap(),
        ];
        for t in transforms {
            for x in counts() {
                let back = t.inverse(t.forward(x));
                assert!(
                    (back - x).abs() < 1e-6 * x.max(1.0),
                    "{} failed round trip at {}: {}",
                    t,
                    x,
                    back
                );
            }
        }
    }

    #[test]
    fn test_monotonic() {
        for t in [Transform::Log, Transform::Power(0.4)] {
            let ys = t.forward_all(&counts());
            assert!(ys.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn test_power_clips_below_domain() {
        let t = Transform::Power(0.5);
        assert_eq!(t.forward(-5.0), 0.0);
        assert_eq!(t.inverse(-2.0), -1.0);
        assert!(!t.forward(-1.5).is_nan());
    }

    #[test]
    fn test_log_clips_below_domain() {
        let t = Transform::Log;
        assert_eq!(t.forward(-3.0), 0.0);
        assert_eq!(t.forward(-1.0), 0.0);
        assert!(t.forward(-0.5).is_finite());
        assert!((t.forward(0.0)).abs() < 1e-15);
    }

    #[test]
    fn test_power_exponent_validation() {
        assert!(Transform::power(0.0).is_err());
        assert!(Transform::power(-0.5).is_err());
        assert!(Transform::power(1.5).is_err());
        assert!(Transform::power(f64::NAN).is_err());
        assert_eq!(Transform::power(0.3).unwrap().exponent(), Some(0.3));
        assert_eq!(Transform::Log.exponent(), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(Transform::Identity.to_string(), "identity");
        assert_eq!(Transform::Power(0.25).to_string(), "power(0.2500)");
    }
}
