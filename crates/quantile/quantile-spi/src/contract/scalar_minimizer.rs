//! Trait for bounded one-dimensional minimization

use crate::model::ScalarMinimum;

/// Minimizes a scalar objective over a closed interval.
pub trait ScalarMinimizer: Send + Sync {
    /// Minimize `objective` over `[lower, upper]`.
    fn minimize(&self, objective: &mut dyn FnMut(f64) -> f64, lower: f64, upper: f64)
        -> ScalarMinimum;

    /// Name of this minimizer
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Mock implementation: evaluates a fixed grid and keeps the best point
    struct GridMinimizer {
        points: usize,
    }

    impl ScalarMinimizer for GridMinimizer {
        fn minimize(
            &self,
            objective: &mut dyn FnMut(f64) -> f64,
            lower: f64,
            upper: f64,
        ) -> ScalarMinimum {
            let step = (upper - lower) / (self.points - 1) as f64;
            let mut best = ScalarMinimum {
                x: lower,
                fun: f64::INFINITY,
                evaluations: 0,
                converged: true,
            };
            for i in 0..self.points {
                let x = lower + step * i as f64;
                let fx = objective(x);
                best.evaluations += 1;
                if fx < best.fun {
                    best.x = x;
                    best.fun = fx;
                }
            }
            best
        }

        fn name(&self) -> &str {
            "grid"
        }
    }

    #[test]
    fn test_grid_minimizer_parabola() {
        let minimizer = GridMinimizer { points: 101 };
        let result = minimizer.minimize(&mut |x| (x - 0.3).powi(2), 0.0, 1.0);
        assert!((result.x - 0.3).abs() < 1e-9);
        assert_eq!(result.evaluations, 101);
        assert_eq!(minimizer.name(), "grid");
    }

    #[test]
    fn test_objective_can_capture_state() {
        let minimizer = GridMinimizer { points: 11 };
        let mut calls = 0;
        let result = minimizer.minimize(
            &mut |x| {
                calls += 1;
                -x
            },
            0.0,
            1.0,
        );
        assert_eq!(calls, 11);
        assert!((result.x - 1.0).abs() < 1e-12);
    }
}
