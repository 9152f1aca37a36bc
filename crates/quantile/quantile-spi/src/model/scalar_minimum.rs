//! Result of a bounded scalar minimization

/// Minimum located by a [`crate::ScalarMinimizer`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScalarMinimum {
    /// Argument of the minimum
    pub x: f64,
    /// Objective value at `x`
    pub fun: f64,
    /// Number of objective evaluations
    pub evaluations: usize,
    /// Whether the tolerance was met before the evaluation cap
    pub converged: bool,
}
