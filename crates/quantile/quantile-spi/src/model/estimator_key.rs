//! Registry key

use serde::{Deserialize, Serialize};
use std::fmt;

/// (location, horizon) pair identifying one fitted estimator.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EstimatorKey {
    pub location: String,
    pub horizon: i32,
}

impl EstimatorKey {
    pub fn new(location: impl Into<String>, horizon: i32) -> Self {
        Self {
            location: location.into(),
            horizon,
        }
    }
}

impl fmt::Display for EstimatorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (h={})", self.location, self.horizon)
    }
}
