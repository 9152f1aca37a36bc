//! Rate-change categories, probabilities and thresholds

use crate::error::QuantileError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Rate-change category reported as a pmf target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendCategory {
    LargeIncrease,
    Increase,
    Stable,
    Decrease,
    LargeDecrease,
}

impl TrendCategory {
    /// All categories in hub order.
    pub const ALL: [TrendCategory; 5] = [
        TrendCategory::LargeIncrease,
        TrendCategory::Increase,
        TrendCategory::Stable,
        TrendCategory::Decrease,
        TrendCategory::LargeDecrease,
    ];

    /// Hub identifier for the category.
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendCategory::LargeIncrease => "large_increase",
            TrendCategory::Increase => "increase",
            TrendCategory::Stable => "stable",
            TrendCategory::Decrease => "decrease",
            TrendCategory::LargeDecrease => "large_decrease",
        }
    }
}

impl fmt::Display for TrendCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrendCategory {
    type Err = QuantileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TrendCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| {
                QuantileError::validation(
                    "output_type_id",
                    format!("rate category '{}' must be one of {:?}", s, category_names()),
                )
            })
    }
}

fn category_names() -> Vec<&'static str> {
    TrendCategory::ALL.iter().map(|c| c.as_str()).collect()
}

/// Probability mass over the five rate-change categories.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendProbabilities {
    pub large_decrease: f64,
    pub decrease: f64,
    pub stable: f64,
    pub increase: f64,
    pub large_increase: f64,
}

impl TrendProbabilities {
    /// Probability assigned to `category`.
    pub fn get(&self, category: TrendCategory) -> f64 {
        match category {
            TrendCategory::LargeIncrease => self.large_increase,
            TrendCategory::Increase => self.increase,
            TrendCategory::Stable => self.stable,
            TrendCategory::Decrease => self.decrease,
            TrendCategory::LargeDecrease => self.large_decrease,
        }
    }

    /// (category, probability) pairs in hub order.
    pub fn iter(&self) -> impl Iterator<Item = (TrendCategory, f64)> + '_ {
        TrendCategory::ALL.into_iter().map(move |c| (c, self.get(c)))
    }

    /// Total mass; 1 up to rounding for a well-formed derivation.
    pub fn sum(&self) -> f64 {
        self.iter().map(|(_, p)| p).sum()
    }
}

/// Rate-change thresholds for one horizon, in rate units per 100,000.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateThreshold {
    /// Half-width of the stable band
    pub stable: f64,
    /// Boundary between increase and large increase
    pub increase: f64,
    /// Boundary between decrease and large decrease (negative)
    pub decrease: f64,
}

impl RateThreshold {
    pub const fn new(stable: f64, increase: f64, decrease: f64) -> Self {
        Self {
            stable,
            increase,
            decrease,
        }
    }
}

/// Immutable horizon → threshold table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateThresholdTable {
    thresholds: BTreeMap<i32, RateThreshold>,
}

impl RateThresholdTable {
    pub fn new(thresholds: BTreeMap<i32, RateThreshold>) -> Self {
        Self { thresholds }
    }

    /// Threshold for `horizon`, if configured.
    pub fn get(&self, horizon: i32) -> Option<&RateThreshold> {
        self.thresholds.get(&horizon)
    }

    pub fn horizons(&self) -> impl Iterator<Item = i32> + '_ {
        self.thresholds.keys().copied()
    }
}

impl Default for RateThresholdTable {
    /// Hub thresholds for the weekly flu hospitalization rate-change target.
    fn default() -> Self {
        let thresholds = BTreeMap::from([
            (-1, RateThreshold::new(1.0, 2.0, -2.0)),
            (0, RateThreshold::new(1.0, 3.0, -3.0)),
            (1, RateThreshold::new(2.0, 4.0, -4.0)),
            (2, RateThreshold::new(2.5, 5.0, -5.0)),
            (3, RateThreshold::new(2.5, 5.0, -5.0)),
        ]);
        Self { thresholds }
    }
}
