//! Hub submission file writer

use crate::validity::{format_quantile, SubmissionWindow};
use chrono::NaiveDate;
use quantile_spi::{
    OutputTypeId, QuantileError, Result, RowStatus, SubmissionRow, TargetType, TrendCategory,
};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Team name used when none is configured.
pub const DEFAULT_TEAM: &str = "MIGHTE";

/// Model name used when none is configured.
pub const DEFAULT_MODEL: &str = "Nsemble";

/// Submission CSV columns, in order.
pub const SUBMISSION_HEADER: [&str; 8] = [
    "reference_date",
    "target",
    "horizon",
    "target_end_date",
    "location",
    "output_type",
    "output_type_id",
    "value",
];

/// Collects validated rows for one reference date and writes them as CSV.
#[derive(Debug, Clone)]
pub struct SubmissionWriter {
    window: SubmissionWindow,
    team: String,
    model: String,
    rows: Vec<SubmissionRow>,
}

impl SubmissionWriter {
    pub fn new(
        reference_date: NaiveDate,
        team: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            window: SubmissionWindow::new(reference_date),
            team: team.into(),
            model: model.into(),
            rows: Vec::new(),
        }
    }

    pub fn reference_date(&self) -> NaiveDate {
        self.window.reference_date()
    }

    pub fn window(&self) -> &SubmissionWindow {
        &self.window
    }

    /// Add an incident hospitalization quantile.
    ///
    /// Returns `Ok(false)` when the row falls outside the submission window.
    pub fn add_quantile(
        &mut self,
        horizon: i32,
        target_end_date: NaiveDate,
        location: &str,
        level: f64,
        value: f64,
    ) -> Result<bool> {
        self.add(
            TargetType::IncidentHospitalizations,
            horizon,
            target_end_date,
            location,
            OutputTypeId::Quantile(level),
            value,
        )
    }

    /// Add a rate-change category probability.
    ///
    /// Returns `Ok(false)` when the row falls outside the submission window.
    pub fn add_pmf(
        &mut self,
        horizon: i32,
        target_end_date: NaiveDate,
        location: &str,
        category: TrendCategory,
        value: f64,
    ) -> Result<bool> {
        self.add(
            TargetType::RateChange,
            horizon,
            target_end_date,
            location,
            OutputTypeId::Category(category),
            value,
        )
    }

    fn add(
        &mut self,
        target: TargetType,
        horizon: i32,
        target_end_date: NaiveDate,
        location: &str,
        id: OutputTypeId,
        value: f64,
    ) -> Result<bool> {
        let output_type = target.required_output_type();
        match self
            .window
            .validate(target, horizon, target_end_date, output_type, &id)?
        {
            RowStatus::OutOfWindow => {
                tracing::debug!(
                    location,
                    horizon,
                    %target_end_date,
                    "dropping row outside submission window"
                );
                return Ok(false);
            }
            RowStatus::Accepted => {}
        }

        let output_type_id = match id {
            OutputTypeId::Quantile(q) => format_quantile(q),
            OutputTypeId::Category(c) => c.as_str().to_string(),
        };
        let value = sanitize_value(value, location, horizon, &output_type_id);

        self.rows.push(SubmissionRow {
            reference_date: self.window.reference_date(),
            target,
            horizon,
            target_end_date,
            location: location.to_string(),
            output_type,
            output_type_id,
            value,
        });
        Ok(true)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows sorted by target, location, output type, horizon and identifier.
    pub fn rows(&self) -> Vec<SubmissionRow> {
        let mut rows = self.rows.clone();
        rows.sort_by(|a, b| {
            a.target
                .as_str()
                .cmp(b.target.as_str())
                .then_with(|| a.location.cmp(&b.location))
                .then_with(|| a.output_type.as_str().cmp(b.output_type.as_str()))
                .then_with(|| a.horizon.cmp(&b.horizon))
                .then_with(|| a.output_type_id.cmp(&b.output_type_id))
        });
        rows
    }

    /// `{reference_date}-{team}-{model}.csv`
    pub fn file_name(&self) -> String {
        format!(
            "{}-{}-{}.csv",
            self.window.reference_date().format("%Y-%m-%d"),
            self.team,
            self.model
        )
    }

    /// Write the sorted rows as CSV. The header line is written even when
    /// there are no rows.
    pub fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);
        csv_writer
            .write_record(SUBMISSION_HEADER)
            .map_err(|e| QuantileError::Csv(e.to_string()))?;
        for row in self.rows() {
            csv_writer
                .serialize(&row)
                .map_err(|e| QuantileError::Csv(e.to_string()))?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    /// Write the submission into `dir` and return the file path.
    pub fn write_file(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let path = dir.as_ref().join(self.file_name());
        let file = File::create(&path)?;
        self.write_to(file)?;
        tracing::info!(path = %path.display(), rows = self.rows.len(), "wrote submission");
        Ok(path)
    }
}

/// Replace NaN or negative values with 0.
fn sanitize_value(value: f64, location: &str, horizon: i32, output_type_id: &str) -> f64 {
    if value.is_nan() || value < 0.0 {
        tracing::warn!(
            location,
            horizon,
            output_type_id,
            value,
            "clamping invalid value to 0"
        );
        0.0
    } else {
        value
    }
}
