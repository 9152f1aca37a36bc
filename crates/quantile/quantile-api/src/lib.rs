//! Quantile Consumer API
//!
//! Consumer configurations and builder APIs for quantile submissions.
//!
//! This crate provides:
//! - Configuration types for calibration, thresholds and submission output
//! - A registry builder driven by configuration
//! - Re-exports from SPI and core for convenience

// Re-export from core
pub use quantile_core::{
    build_registry, build_registry_with, calendar, calibrate_power, calibration, estimator,
    format_quantile, is_hub_quantile, minimize, mmwr_week, normality, pipeline, registry,
    season_flags, transform, trend, trend_from_deltas, trend_probabilities, validate_row,
    validity, writer, BoundedBrent, Calibration, EstimatorRegistry, PipelineSummary,
    PowerCalibrator, SeasonalDispersion, SeasonalNormalQuantiles, ShapiroWilk, SubmissionPipeline,
    SubmissionWindow, SubmissionWriter, Transform, TrendDeltas, QUANTILE_LEVELS,
};

// Re-export traits from SPI
pub use quantile_spi::{
    CumulativeDistribution, EstimatorKey, LastObservation, LocationInfo, OutputType, OutputTypeId,
    PointForecast, QuantileError, QuantileEstimator, RateThreshold, RateThresholdTable,
    ResidualSample, Result, RowStatus, ScalarMinimizer, ScalarMinimum, Season, SeasonFlags,
    SubmissionRow, TargetType, TrendCategory, TrendProbabilities,
};

use chrono::NaiveDate;
use quantile_core::calibration::{MAX_EXPONENT, MIN_EXPONENT};
use quantile_core::pipeline::DEFAULT_HORIZON_OFFSET;
use quantile_core::writer::{DEFAULT_MODEL, DEFAULT_TEAM};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Configuration for the power exponent search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Lower bound of the exponent search
    pub min_exponent: f64,
    /// Upper bound of the exponent search
    pub max_exponent: f64,
    /// Absolute tolerance on the exponent
    pub x_tolerance: f64,
    /// Cap on normality test evaluations per pair
    pub max_evaluations: usize,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            min_exponent: MIN_EXPONENT,
            max_exponent: MAX_EXPONENT,
            x_tolerance: 1e-5,
            max_evaluations: 500,
        }
    }
}

impl CalibrationConfig {
    /// Calibrator for this configuration.
    pub fn calibrator(&self) -> Result<PowerCalibrator<BoundedBrent>> {
        let minimizer = BoundedBrent::new()
            .with_tolerance(self.x_tolerance)
            .with_max_evaluations(self.max_evaluations);
        PowerCalibrator::with_minimizer(minimizer).with_bounds(self.min_exponent, self.max_exponent)
    }
}

/// Rate-change thresholds per hub horizon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThresholdConfig {
    pub thresholds: BTreeMap<i32, RateThreshold>,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        let table = RateThresholdTable::default();
        let thresholds = table
            .horizons()
            .filter_map(|h| table.get(h).map(|t| (h, *t)))
            .collect();
        Self { thresholds }
    }
}

impl ThresholdConfig {
    pub fn table(&self) -> RateThresholdTable {
        RateThresholdTable::new(self.thresholds.clone())
    }
}

/// Configuration for the submission file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubmissionConfig {
    /// Team name in the output file name
    pub team: String,
    /// Model name in the output file name
    pub model: String,
    /// Season whose dispersion is used for queries
    pub season: Season,
    /// Forecast-file horizon minus hub horizon
    pub horizon_offset: i32,
}

impl Default for SubmissionConfig {
    fn default() -> Self {
        Self {
            team: DEFAULT_TEAM.to_string(),
            model: DEFAULT_MODEL.to_string(),
            season: Season::Fall,
            horizon_offset: DEFAULT_HORIZON_OFFSET,
        }
    }
}

/// Complete configuration, loadable from a JSON file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HubcastConfig {
    pub calibration: CalibrationConfig,
    pub submission: SubmissionConfig,
    pub thresholds: ThresholdConfig,
}

impl HubcastConfig {
    /// Parse a JSON document. Missing sections keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| QuantileError::invalid_parameter("config", e.to_string()))
    }

    /// Load a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Empty writer for `reference_date` named after the configured team and model.
    pub fn writer(&self, reference_date: NaiveDate) -> SubmissionWriter {
        SubmissionWriter::new(
            reference_date,
            self.submission.team.clone(),
            self.submission.model.clone(),
        )
    }

    /// Pipeline over `registry` with the configured season, offset and thresholds.
    pub fn pipeline<'a>(&self, registry: &'a EstimatorRegistry) -> SubmissionPipeline<'a> {
        SubmissionPipeline::new(registry)
            .with_season(self.submission.season)
            .with_horizon_offset(self.submission.horizon_offset)
            .with_thresholds(self.thresholds.table())
    }
}

/// Builder for an [`EstimatorRegistry`]
#[derive(Debug, Clone, Default)]
pub struct RegistryBuilder {
    calibration: CalibrationConfig,
    locations: Option<Vec<String>>,
    horizons: Option<Vec<i32>>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calibration(mut self, config: CalibrationConfig) -> Self {
        self.calibration = config;
        self
    }

    /// Only fit these locations.
    pub fn locations(mut self, locations: Vec<String>) -> Self {
        self.locations = Some(locations);
        self
    }

    /// Only fit these horizons.
    pub fn horizons(mut self, horizons: Vec<i32>) -> Self {
        self.horizons = Some(horizons);
        self
    }

    /// Fit one estimator per pair with history in `training`.
    pub fn build(&self, training: &[ResidualSample]) -> Result<EstimatorRegistry> {
        let calibrator = self.calibration.calibrator()?;
        let registry = match (&self.locations, &self.horizons) {
            (None, None) => build_registry_with(&calibrator, training),
            (locations, horizons) => {
                let locations = locations
                    .clone()
                    .unwrap_or_else(|| distinct(training.iter().map(|s| s.location.clone())));
                let horizons = horizons
                    .clone()
                    .unwrap_or_else(|| distinct(training.iter().map(|s| s.horizon)));
                EstimatorRegistry::build_with(&calibrator, &locations, &horizons, training)
            }
        };
        Ok(registry)
    }
}

fn distinct<T: Ord>(values: impl Iterator<Item = T>) -> Vec<T> {
    let mut values: Vec<T> = values.collect();
    values.sort();
    values.dedup();
    values
}

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        CalibrationConfig, HubcastConfig, RegistryBuilder, SubmissionConfig, ThresholdConfig,
    };
    pub use quantile_core::{
        build_registry, trend_probabilities, validate_row, EstimatorRegistry, SubmissionPipeline,
        SubmissionWriter, Transform, QUANTILE_LEVELS,
    };
    pub use quantile_spi::{
        CumulativeDistribution, LastObservation, LocationInfo, PointForecast, QuantileError,
        QuantileEstimator, RateThresholdTable, ResidualSample, Result, Season, SeasonFlags,
        TrendCategory,
    };
}
