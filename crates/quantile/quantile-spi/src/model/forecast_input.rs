//! Inputs for a submission batch

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Current point forecast to be turned into a predictive distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointForecast {
    pub location: String,
    /// Horizon as it appears in the forecast files
    pub horizon: i32,
    /// Week-ending date the forecast targets
    pub date_predicted: NaiveDate,
    pub value: f64,
}

impl PointForecast {
    pub fn new(
        location: impl Into<String>,
        horizon: i32,
        date_predicted: NaiveDate,
        value: f64,
    ) -> Self {
        Self {
            location: location.into(),
            horizon,
            date_predicted,
            value,
        }
    }
}

/// Most recent reported count and rate for a location.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LastObservation {
    /// Weekly hospitalization count
    pub count: f64,
    /// Weekly rate per 100,000 population
    pub rate: f64,
}

impl LastObservation {
    pub fn new(count: f64, rate: f64) -> Self {
        Self { count, rate }
    }
}

/// Per-location reference data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationInfo {
    /// Hub location code (FIPS style, e.g. "06" or "US")
    pub code: String,
    pub population: f64,
    pub last_observation: Option<LastObservation>,
}

impl LocationInfo {
    pub fn new(code: impl Into<String>, population: f64) -> Self {
        Self {
            code: code.into(),
            population,
            last_observation: None,
        }
    }

    pub fn with_last_observation(mut self, last: LastObservation) -> Self {
        self.last_observation = Some(last);
        self
    }
}
