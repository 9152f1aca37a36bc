//! Hub submission row and its typed fields

use crate::error::QuantileError;
use crate::model::TrendCategory;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Forecast target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TargetType {
    /// Weekly incident flu hospitalizations
    #[serde(rename = "wk inc flu hosp")]
    IncidentHospitalizations,
    /// Weekly flu hospitalization rate change
    #[serde(rename = "wk flu hosp rate change")]
    RateChange,
}

impl TargetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetType::IncidentHospitalizations => "wk inc flu hosp",
            TargetType::RateChange => "wk flu hosp rate change",
        }
    }

    /// Output type the hub requires for this target.
    pub fn required_output_type(&self) -> OutputType {
        match self {
            TargetType::IncidentHospitalizations => OutputType::Quantile,
            TargetType::RateChange => OutputType::Pmf,
        }
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetType {
    type Err = QuantileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "wk inc flu hosp" => Ok(TargetType::IncidentHospitalizations),
            "wk flu hosp rate change" => Ok(TargetType::RateChange),
            other => Err(QuantileError::validation(
                "target",
                format!("unknown target '{}'", other),
            )),
        }
    }
}

/// Hub output type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputType {
    Quantile,
    Pmf,
}

impl OutputType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputType::Quantile => "quantile",
            OutputType::Pmf => "pmf",
        }
    }
}

impl fmt::Display for OutputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputType {
    type Err = QuantileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "quantile" => Ok(OutputType::Quantile),
            "pmf" => Ok(OutputType::Pmf),
            other => Err(QuantileError::validation(
                "output_type",
                format!("'{}' must be 'quantile' or 'pmf'", other),
            )),
        }
    }
}

/// Output type identifier: a quantile level or a rate-change category.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputTypeId {
    Quantile(f64),
    Category(TrendCategory),
}

impl OutputTypeId {
    /// Output type this identifier belongs to.
    pub fn output_type(&self) -> OutputType {
        match self {
            OutputTypeId::Quantile(_) => OutputType::Quantile,
            OutputTypeId::Category(_) => OutputType::Pmf,
        }
    }
}

/// Outcome of checking a row against the submission window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowStatus {
    /// Row is well formed and inside the window
    Accepted,
    /// Row is well formed but targets a (date, horizon) outside the window
    OutOfWindow,
}

/// One row of a hub submission file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionRow {
    pub reference_date: NaiveDate,
    pub target: TargetType,
    pub horizon: i32,
    pub target_end_date: NaiveDate,
    pub location: String,
    pub output_type: OutputType,
    /// Formatted identifier ("0.025", "stable", ...)
    pub output_type_id: String,
    pub value: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_pairing() {
        assert_eq!(
            TargetType::IncidentHospitalizations.required_output_type(),
            OutputType::Quantile
        );
        assert_eq!(TargetType::RateChange.required_output_type(), OutputType::Pmf);
    }

    #[test]
    fn test_target_parse() {
        assert_eq!(
            "wk inc flu hosp".parse::<TargetType>().unwrap(),
            TargetType::IncidentHospitalizations
        );
        let err = "wk inc covid hosp".parse::<TargetType>().unwrap_err();
        assert!(matches!(err, QuantileError::Validation { field: "target", .. }));
    }

    #[test]
    fn test_output_type_parse() {
        assert_eq!("pmf".parse::<OutputType>().unwrap(), OutputType::Pmf);
        let err = "sample".parse::<OutputType>().unwrap_err();
        assert!(matches!(err, QuantileError::Validation { field: "output_type", .. }));
    }

    #[test]
    fn test_output_type_id_kind() {
        assert_eq!(OutputTypeId::Quantile(0.5).output_type(), OutputType::Quantile);
        assert_eq!(
            OutputTypeId::Category(TrendCategory::Stable).output_type(),
            OutputType::Pmf
        );
    }
}
