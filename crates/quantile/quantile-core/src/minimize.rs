//! Bounded scalar minimization
//!
//! Brent's method on a closed interval: golden-section steps, accelerated by
//! parabolic interpolation whenever the fitted parabola stays in the bracket.

use quantile_spi::{ScalarMinimizer, ScalarMinimum};

/// Brent's bounded minimizer.
#[derive(Debug, Clone)]
pub struct BoundedBrent {
    x_tolerance: f64,
    max_evaluations: usize,
}

impl BoundedBrent {
    pub fn new() -> Self {
        Self {
            x_tolerance: 1e-5,
            max_evaluations: 500,
        }
    }

    /// Absolute tolerance on the argument.
    pub fn with_tolerance(mut self, x_tolerance: f64) -> Self {
        self.x_tolerance = x_tolerance;
        self
    }

    /// Cap on objective evaluations.
    pub fn with_max_evaluations(mut self, max_evaluations: usize) -> Self {
        self.max_evaluations = max_evaluations.max(1);
        self
    }
}

impl Default for BoundedBrent {
    fn default() -> Self {
        Self::new()
    }
}

/// sign(v), with sign(0) = 1
fn step_sign(v: f64) -> f64 {
    if v >= 0.0 {
        1.0
    } else {
        -1.0
    }
}

impl ScalarMinimizer for BoundedBrent {
    fn minimize(
        &self,
        objective: &mut dyn FnMut(f64) -> f64,
        lower: f64,
        upper: f64,
    ) -> ScalarMinimum {
        let sqrt_eps = f64::EPSILON.sqrt();
        let golden_mean = 0.5 * (3.0 - 5.0_f64.sqrt());

        let (mut a, mut b) = if lower <= upper {
            (lower, upper)
        } else {
            (upper, lower)
        };

        // xf: best point, nfc: second best, fulc: previous second best
        let mut fulc = a + golden_mean * (b - a);
        let mut nfc = fulc;
        let mut xf = fulc;
        let mut rat = 0.0_f64;
        let mut e = 0.0_f64;

        let mut fx = objective(xf);
        let mut evaluations = 1;
        let mut ffulc = fx;
        let mut fnfc = fx;

        let mut xm = 0.5 * (a + b);
        let mut tol1 = sqrt_eps * xf.abs() + self.x_tolerance / 3.0;
        let mut tol2 = 2.0 * tol1;
        let mut converged = true;

        while (xf - xm).abs() > tol2 - 0.5 * (b - a) {
            let mut golden = true;

            if e.abs() > tol1 {
                golden = false;
                let mut r = (xf - nfc) * (fx - ffulc);
                let mut q = (xf - fulc) * (fx - fnfc);
                let mut p = (xf - fulc) * q - (xf - nfc) * r;
                q = 2.0 * (q - r);
                if q > 0.0 {
                    p = -p;
                }
                q = q.abs();
                r = e;
                e = rat;

                if p.abs() < (0.5 * q * r).abs() && p > q * (a - xf) && p < q * (b - xf) {
                    // Parabolic step
                    rat = p / q;
                    let x = xf + rat;
                    if (x - a) < tol2 || (b - x) < tol2 {
                        rat = tol1 * step_sign(xm - xf);
                    }
                } else {
                    golden = true;
                }
            }

            if golden {
                e = if xf >= xm { a - xf } else { b - xf };
                rat = golden_mean * e;
            }

            let x = xf + step_sign(rat) * rat.abs().max(tol1);
            let fu = objective(x);
            evaluations += 1;

            if fu <= fx {
                if x >= xf {
                    a = xf;
                } else {
                    b = xf;
                }
                fulc = nfc;
                ffulc = fnfc;
                nfc = xf;
                fnfc = fx;
                xf = x;
                fx = fu;
            } else {
                if x < xf {
                    a = x;
                } else {
                    b = x;
                }
                if fu <= fnfc || nfc == xf {
                    fulc = nfc;
                    ffulc = fnfc;
                    nfc = x;
                    fnfc = fu;
                } else if fu <= ffulc || fulc == xf || fulc == nfc {
                    fulc = x;
                    ffulc = fu;
                }
            }

            xm = 0.5 * (a + b);
            tol1 = sqrt_eps * xf.abs() + self.x_tolerance / 3.0;
            tol2 = 2.0 * tol1;

            if evaluations >= self.max_evaluations {
                converged = false;
                break;
            }
        }

        ScalarMinimum {
            x: xf,
            fun: fx,
            evaluations,
            converged: converged && !xf.is_nan() && !fx.is_nan(),
        }
    }

    fn name(&self) -> &str {
        "bounded-brent"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parabola_inside_bounds() {
        let brent = BoundedBrent::new();
        let result = brent.minimize(&mut |x| (x - 0.43).powi(2) + 1.0, 0.2, 0.99);
        assert!((result.x - 0.43).abs() < 1e-4, "x = {}", result.x);
        assert!((result.fun - 1.0).abs() < 1e-8);
        assert!(result.converged);
        assert!(result.evaluations < 50);
    }

    #[test]
    fn test_minimum_outside_bounds_hits_edge() {
        let brent = BoundedBrent::new();
        let result = brent.minimize(&mut |x| (x - 5.0).powi(2), 0.2, 0.99);
        assert!((result.x - 0.99).abs() < 1e-3, "x = {}", result.x);
        assert!(result.x <= 0.99);

        let result = brent.minimize(&mut |x| x, 0.2, 0.99);
        assert!((result.x - 0.2).abs() < 1e-3, "x = {}", result.x);
        assert!(result.x >= 0.2);
    }

    #[test]
    fn test_non_smooth_objective() {
        let brent = BoundedBrent::new();
        let result = brent.minimize(&mut |x| (x - 0.7).abs(), 0.0, 1.0);
        assert!((result.x - 0.7).abs() < 1e-4);
    }

    #[test]
    fn test_reversed_bounds() {
        let brent = BoundedBrent::new();
        let result = brent.minimize(&mut |x| (x - 0.5).powi(2), 1.0, 0.0);
        assert!((result.x - 0.5).abs() < 1e-4);
    }

    #[test]
    fn test_evaluation_cap() {
        let brent = BoundedBrent::new().with_tolerance(1e-12).with_max_evaluations(5);
        let mut calls = 0;
        let result = brent.minimize(
            &mut |x| {
                calls += 1;
                (x - 0.3).powi(2)
            },
            0.0,
            1.0,
        );
        assert_eq!(result.evaluations, 5);
        assert_eq!(calls, 5);
        assert!(!result.converged);
    }

    #[test]
    fn test_nan_objective_not_converged() {
        let brent = BoundedBrent::new();
        let result = brent.minimize(&mut |_| f64::NAN, 0.0, 1.0);
        assert!(!result.converged);
    }

    #[test]
    fn test_name() {
        assert_eq!(BoundedBrent::default().name(), "bounded-brent");
    }
}
