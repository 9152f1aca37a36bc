//! Season labels used to condition residual dispersion

use crate::error::QuantileError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Season label. `Overall` pools every sample regardless of calendar flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Season {
    Fall,
    Winter,
    Spring,
    Overall,
}

impl Season {
    /// Calendar seasons, excluding the pooled `Overall` label.
    pub const CALENDAR: [Season; 3] = [Season::Fall, Season::Winter, Season::Spring];

    pub fn as_str(&self) -> &'static str {
        match self {
            Season::Fall => "Fall",
            Season::Winter => "Winter",
            Season::Spring => "Spring",
            Season::Overall => "Overall",
        }
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Season {
    type Err = QuantileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fall" => Ok(Season::Fall),
            "winter" => Ok(Season::Winter),
            "spring" => Ok(Season::Spring),
            "overall" => Ok(Season::Overall),
            other => Err(QuantileError::invalid_parameter(
                "season",
                format!("unknown season '{}'", other),
            )),
        }
    }
}

/// Per-sample season membership flags (0/1 columns in the error history).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonFlags {
    pub fall: bool,
    pub winter: bool,
    pub spring: bool,
}

impl SeasonFlags {
    pub fn new(fall: bool, winter: bool, spring: bool) -> Self {
        Self {
            fall,
            winter,
            spring,
        }
    }

    /// Flags for a target week by MMWR week number.
    ///
    /// Fall spans weeks 40-51, Winter week 52 onward plus weeks 1-10, and
    /// Spring weeks 11-20. Summer weeks belong to no calendar season.
    pub fn from_week(week: u32) -> Self {
        Self {
            fall: (40..=51).contains(&week),
            winter: week >= 52 || week < 11,
            spring: (11..=20).contains(&week),
        }
    }

    /// Whether a sample with these flags belongs to `season`.
    ///
    /// Every sample belongs to `Overall`.
    pub fn contains(&self, season: Season) -> bool {
        match season {
            Season::Fall => self.fall,
            Season::Winter => self.winter,
            Season::Spring => self.spring,
            Season::Overall => true,
        }
    }
}
