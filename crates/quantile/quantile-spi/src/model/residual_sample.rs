//! Historical forecast error sample

use crate::model::SeasonFlags;
use serde::{Deserialize, Serialize};

/// One historical (forecast, truth) pair for a location and horizon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResidualSample {
    /// Location name as it appears in the forecast files
    pub location: String,
    /// Horizon as it appears in the forecast files
    pub horizon: i32,
    /// Point forecast that was issued
    pub forecast: f64,
    /// Observed truth; `None` when not yet reported
    pub truth: Option<f64>,
    /// Season membership of the forecast target week
    pub seasons: SeasonFlags,
}

impl ResidualSample {
    pub fn new(
        location: impl Into<String>,
        horizon: i32,
        forecast: f64,
        truth: Option<f64>,
        seasons: SeasonFlags,
    ) -> Self {
        Self {
            location: location.into(),
            horizon,
            forecast,
            truth,
            seasons,
        }
    }

    /// Truth value, if it is present and not NaN.
    pub fn observed(&self) -> Option<f64> {
        self.truth.filter(|t| !t.is_nan())
    }
}
