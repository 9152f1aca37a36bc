//! Forecast batch to submission rows
//!
//! For each point forecast the pipeline looks up the fitted estimator, maps
//! the data horizon onto the hub horizon, and writes the 23 quantiles plus
//! the five rate-change probabilities for rows inside the submission window.

use crate::registry::EstimatorRegistry;
use crate::trend::trend_probabilities;
use crate::validity::QUANTILE_LEVELS;
use crate::writer::SubmissionWriter;
use quantile_spi::{
    LocationInfo, PointForecast, QuantileEstimator, RateThresholdTable, Result, Season,
};
use std::collections::HashMap;

/// Offset between horizons in the forecast files and hub horizons.
pub const DEFAULT_HORIZON_OFFSET: i32 = 2;

/// Counts of rows written and skipped by a pipeline run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineSummary {
    /// Forecasts that produced quantile rows
    pub forecasts_written: usize,
    pub quantile_rows: usize,
    pub pmf_rows: usize,
    /// No estimator for the (location, horizon) pair
    pub missing_estimator: usize,
    /// (date, horizon) outside the submission window
    pub out_of_window: usize,
    /// No code or population for the location
    pub missing_location: usize,
    /// Quantiles written but no last observation to anchor the trend
    pub missing_observation: usize,
}

impl PipelineSummary {
    pub fn rows_written(&self) -> usize {
        self.quantile_rows + self.pmf_rows
    }

    pub fn forecasts_skipped(&self) -> usize {
        self.missing_estimator + self.out_of_window + self.missing_location
    }
}

/// Turns point forecasts into hub rows using a fitted registry.
#[derive(Debug, Clone)]
pub struct SubmissionPipeline<'a> {
    registry: &'a EstimatorRegistry,
    season: Season,
    horizon_offset: i32,
    thresholds: RateThresholdTable,
}

impl<'a> SubmissionPipeline<'a> {
    /// Pipeline querying the Fall dispersion with the default thresholds.
    pub fn new(registry: &'a EstimatorRegistry) -> Self {
        Self {
            registry,
            season: Season::Fall,
            horizon_offset: DEFAULT_HORIZON_OFFSET,
            thresholds: RateThresholdTable::default(),
        }
    }

    /// Season whose dispersion is used for queries.
    pub fn with_season(mut self, season: Season) -> Self {
        self.season = season;
        self
    }

    pub fn with_horizon_offset(mut self, offset: i32) -> Self {
        self.horizon_offset = offset;
        self
    }

    pub fn with_thresholds(mut self, thresholds: RateThresholdTable) -> Self {
        self.thresholds = thresholds;
        self
    }

    pub fn season(&self) -> Season {
        self.season
    }

    pub fn horizon_offset(&self) -> i32 {
        self.horizon_offset
    }

    /// Write rows for every usable forecast into `writer`.
    ///
    /// `locations` is keyed by the location name used in the forecasts.
    /// Unusable forecasts are skipped and counted; malformed rows and
    /// estimator failures are errors.
    pub fn run(
        &self,
        forecasts: &[PointForecast],
        locations: &HashMap<String, LocationInfo>,
        writer: &mut SubmissionWriter,
    ) -> Result<PipelineSummary> {
        let mut summary = PipelineSummary::default();

        for forecast in forecasts {
            let Some(estimator) = self.registry.lookup(&forecast.location, forecast.horizon) else {
                tracing::warn!(
                    location = %forecast.location,
                    horizon = forecast.horizon,
                    "missing quantile estimator"
                );
                summary.missing_estimator += 1;
                continue;
            };

            let horizon = forecast.horizon - self.horizon_offset;
            let target_end_date = forecast.date_predicted;
            if !writer.window().contains(target_end_date, horizon) {
                tracing::debug!(
                    location = %forecast.location,
                    horizon,
                    %target_end_date,
                    "forecast outside submission window"
                );
                summary.out_of_window += 1;
                continue;
            }

            let Some(info) = locations.get(&forecast.location) else {
                tracing::warn!(location = %forecast.location, "missing location metadata");
                summary.missing_location += 1;
                continue;
            };

            let season = estimator.season_or_overall(self.season);
            let values = estimator.quantiles(&QUANTILE_LEVELS, forecast.value, season)?;
            for (&level, value) in QUANTILE_LEVELS.iter().zip(values) {
                if writer.add_quantile(horizon, target_end_date, &info.code, level, value)? {
                    summary.quantile_rows += 1;
                }
            }
            summary.forecasts_written += 1;

            let Some(last) = info.last_observation else {
                tracing::warn!(
                    location = %forecast.location,
                    "no last observation, skipping rate-change rows"
                );
                summary.missing_observation += 1;
                continue;
            };

            let probabilities = trend_probabilities(
                estimator,
                forecast.value,
                &last,
                info.population,
                horizon,
                &self.thresholds,
                season,
            )?;
            for (category, p) in probabilities.iter() {
                if writer.add_pmf(horizon, target_end_date, &info.code, category, p)? {
                    summary.pmf_rows += 1;
                }
            }
        }

        tracing::info!(
            rows = summary.rows_written(),
            skipped = summary.forecasts_skipped(),
            "submission rows generated"
        );
        Ok(summary)
    }
}
