//! Shapiro-Wilk normality test
//!
//! Royston's approximation (Applied Statistics algorithm AS R94) for the W
//! statistic coefficients and its p-value, valid for 3 <= n <= 5000.

use quantile_spi::{QuantileError, Result};
use statrs::distribution::{ContinuousCDF, Normal};

/// Smallest sample the test is defined for.
pub const MIN_SAMPLES: usize = 3;

const SMALL: f64 = 1e-19;

// Polynomial coefficients, lowest order first.
const C1: [f64; 6] = [0.0, 0.221157, -0.147981, -2.071190, 4.434685, -2.706056];
const C2: [f64; 6] = [0.0, 0.042981, -0.293762, -1.752461, 5.682633, -3.582633];
const C3: [f64; 4] = [0.5440, -0.39978, 0.025054, -6.714e-4];
const C4: [f64; 4] = [1.3822, -0.77857, 0.062767, -0.0020322];
const C5: [f64; 4] = [-1.5861, -0.31082, -0.083751, 0.0038915];
const C6: [f64; 3] = [-0.4803, -0.082676, 0.0030302];
const G: [f64; 2] = [-2.273, 0.459];

/// Result of a Shapiro-Wilk test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapiroWilk {
    /// W statistic in (0, 1]; values near 1 indicate normality
    pub statistic: f64,
    /// Probability of a W this small under normality
    pub p_value: f64,
}

impl ShapiroWilk {
    /// Run the test on `data`.
    ///
    /// A sample with zero range is reported as perfectly normal (W = 1, p = 1).
    pub fn test(data: &[f64]) -> Result<Self> {
        let n = data.len();
        if n < MIN_SAMPLES {
            return Err(QuantileError::InsufficientData {
                required: MIN_SAMPLES,
                actual: n,
            });
        }
        if data.iter().any(|x| !x.is_finite()) {
            return Err(QuantileError::NumericalError(
                "Shapiro-Wilk input contains non-finite values".to_string(),
            ));
        }

        let mut x = data.to_vec();
        x.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let range = x[n - 1] - x[0];
        if range < SMALL {
            return Ok(Self {
                statistic: 1.0,
                p_value: 1.0,
            });
        }

        let std_normal = standard_normal()?;
        let coefficients = coefficients(n, &std_normal);

        // Scale by range for numerical stability, as in the reference algorithm
        let scaled: Vec<f64> = x.iter().map(|v| v / range).collect();
        let mean = scaled.iter().sum::<f64>() / n as f64;
        let ss: f64 = scaled.iter().map(|v| (v - mean).powi(2)).sum();

        let half = n / 2;
        let b: f64 = (0..half)
            .map(|i| coefficients[i] * (scaled[n - 1 - i] - scaled[i]))
            .sum();
        let w = ((b * b) / ss).min(1.0);

        let p_value = p_value(w, n, &std_normal)?;
        Ok(Self {
            statistic: w,
            p_value,
        })
    }
}

/// Standard normal distribution.
pub(crate) fn standard_normal() -> Result<Normal> {
    Normal::new(0.0, 1.0).map_err(|e| QuantileError::NumericalError(e.to_string()))
}

/// Evaluate c[0] + c[1] x + c[2] x^2 + ...
fn poly(c: &[f64], x: f64) -> f64 {
    c.iter().rev().fold(0.0, |acc, &ci| acc * x + ci)
}

/// Antisymmetric coefficients a_1..a_{n/2} (positive, for the upper half).
fn coefficients(n: usize, std_normal: &Normal) -> Vec<f64> {
    let half = n / 2;
    if n == 3 {
        return vec![std::f64::consts::FRAC_1_SQRT_2];
    }

    let an = n as f64;
    let an25 = an + 0.25;
    let m: Vec<f64> = (1..=half)
        .map(|i| std_normal.inverse_cdf((i as f64 - 0.375) / an25))
        .collect();
    let summ2 = 2.0 * m.iter().map(|v| v * v).sum::<f64>();
    let ssumm2 = summ2.sqrt();
    let rsn = 1.0 / an.sqrt();

    let mut a = vec![0.0; half];
    let a1 = poly(&C1, rsn) - m[0] / ssumm2;

    let (first_scaled, fac) = if n > 5 {
        let a2 = -m[1] / ssumm2 + poly(&C2, rsn);
        a[1] = a2;
        let fac = ((summ2 - 2.0 * m[0].powi(2) - 2.0 * m[1].powi(2))
            / (1.0 - 2.0 * a1.powi(2) - 2.0 * a2.powi(2)))
        .sqrt();
        (2, fac)
    } else {
        let fac = ((summ2 - 2.0 * m[0].powi(2)) / (1.0 - 2.0 * a1.powi(2))).sqrt();
        (1, fac)
    };
    a[0] = a1;
    for i in first_scaled..half {
        a[i] = -m[i] / fac;
    }
    a
}

fn p_value(w: f64, n: usize, std_normal: &Normal) -> Result<f64> {
    if n == 3 {
        // Exact distribution for n = 3
        const PI6: f64 = 6.0 / std::f64::consts::PI;
        const STQR: f64 = std::f64::consts::FRAC_PI_3;
        return Ok((PI6 * (w.sqrt().asin() - STQR)).clamp(0.0, 1.0));
    }

    let an = n as f64;
    let mut y = (1.0 - w).ln();
    let (mean, sd) = if n <= 11 {
        let gamma = poly(&G, an);
        if y >= gamma {
            return Ok(1e-99);
        }
        y = -(gamma - y).ln();
        (poly(&C3, an), poly(&C4, an).exp())
    } else {
        let xx = an.ln();
        (poly(&C5, xx), poly(&C6, xx).exp())
    };

    // Upper tail of N(mean, sd) at y
    let z = (y - mean) / sd;
    Ok(std_normal.cdf(-z).clamp(0.0, 1.0))
}
