//! Submission validity contract
//!
//! Malformed rows are hard errors naming the offending field. Rows that are
//! well formed but fall outside the reference week's (date, horizon) window
//! are reported as [`RowStatus::OutOfWindow`] so callers can drop them.

use chrono::{Duration, NaiveDate};
use quantile_spi::{OutputType, OutputTypeId, QuantileError, Result, RowStatus, TargetType};

/// Earliest submission horizon (nowcast of the previous week).
pub const MIN_HORIZON: i32 = -1;

/// Latest submission horizon.
pub const MAX_HORIZON: i32 = 3;

/// Quantile levels accepted by the hub.
pub const QUANTILE_LEVELS: [f64; 23] = [
    0.01, 0.025, 0.05, 0.1, 0.15, 0.2, 0.25, 0.3, 0.35, 0.4, 0.45, 0.5, 0.55, 0.6, 0.65, 0.7,
    0.75, 0.8, 0.85, 0.9, 0.95, 0.975, 0.99,
];

fn round_level(q: f64) -> f64 {
    (q * 1000.0).round() / 1000.0
}

/// Whether `q`, rounded to 3 decimals, is one of [`QUANTILE_LEVELS`].
pub fn is_hub_quantile(q: f64) -> bool {
    let rounded = round_level(q);
    QUANTILE_LEVELS.iter().any(|l| (rounded - l).abs() < 1e-9)
}

/// Hub identifier for a quantile level: rounded to 3 decimals, shortest form.
pub fn format_quantile(q: f64) -> String {
    format!("{}", round_level(q))
}

/// Valid (target_end_date, horizon) pairs for one reference date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionWindow {
    reference_date: NaiveDate,
    entries: Vec<(NaiveDate, i32)>,
}

impl SubmissionWindow {
    /// Window of weekly target dates from one week before the reference
    /// date to three weeks after it.
    pub fn new(reference_date: NaiveDate) -> Self {
        let entries = (MIN_HORIZON..=MAX_HORIZON)
            .map(|h| (reference_date + Duration::weeks(i64::from(h)), h))
            .collect();
        Self {
            reference_date,
            entries,
        }
    }

    pub fn reference_date(&self) -> NaiveDate {
        self.reference_date
    }

    /// Target end date for `horizon`, if the horizon is in range.
    pub fn target_end_date(&self, horizon: i32) -> Option<NaiveDate> {
        self.entries
            .iter()
            .find(|(_, h)| *h == horizon)
            .map(|(date, _)| *date)
    }

    pub fn contains(&self, target_end_date: NaiveDate, horizon: i32) -> bool {
        self.entries.contains(&(target_end_date, horizon))
    }

    pub fn entries(&self) -> &[(NaiveDate, i32)] {
        &self.entries
    }

    /// Check one row against the contract.
    pub fn validate(
        &self,
        target: TargetType,
        horizon: i32,
        target_end_date: NaiveDate,
        output_type: OutputType,
        output_type_id: &OutputTypeId,
    ) -> Result<RowStatus> {
        if !(MIN_HORIZON..=MAX_HORIZON).contains(&horizon) {
            return Err(QuantileError::validation(
                "horizon",
                format!("{} is outside {}..={}", horizon, MIN_HORIZON, MAX_HORIZON),
            ));
        }

        let required = target.required_output_type();
        if output_type != required {
            return Err(QuantileError::validation(
                "output_type",
                format!("target '{}' requires '{}', got '{}'", target, required, output_type),
            ));
        }

        if output_type_id.output_type() != output_type {
            return Err(QuantileError::validation(
                "output_type_id",
                format!("identifier does not match output type '{}'", output_type),
            ));
        }

        if let OutputTypeId::Quantile(q) = output_type_id {
            if !is_hub_quantile(*q) {
                return Err(QuantileError::validation(
                    "output_type_id",
                    format!("quantile level {} is not a hub level", q),
                ));
            }
        }

        if self.contains(target_end_date, horizon) {
            Ok(RowStatus::Accepted)
        } else {
            Ok(RowStatus::OutOfWindow)
        }
    }
}

/// Check one row against the contract for `reference_date`.
pub fn validate_row(
    target: TargetType,
    horizon: i32,
    target_end_date: NaiveDate,
    output_type: OutputType,
    output_type_id: &OutputTypeId,
    reference_date: NaiveDate,
) -> Result<RowStatus> {
    SubmissionWindow::new(reference_date).validate(
        target,
        horizon,
        target_end_date,
        output_type,
        output_type_id,
    )
}
