//! CSV loading for forecast history, current forecasts and location data.

use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use chrono::NaiveDate;
use quantile_facade::{
    season_flags, LastObservation, LocationInfo, PointForecast, ResidualSample, SeasonFlags,
};
use serde::Deserialize;

/// Error type for data loading operations.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse CSV: {0}")]
    CsvError(String),

    #[error("No rows found in {0}")]
    NoRows(String),

    #[error("More than one observation for '{location}' on {date}")]
    DuplicateObservation { location: String, date: NaiveDate },
}

/// One row of a forecast file. History files carry `target_value` and
/// optionally 0/1 season columns; current forecast files carry neither.
#[derive(Debug, Deserialize)]
struct ForecastRecord {
    date_predicted: NaiveDate,
    location_name: String,
    horizon: i32,
    value: f64,
    #[serde(default)]
    target_value: Option<f64>,
    #[serde(rename = "Fall", default)]
    fall: Option<f64>,
    #[serde(rename = "Winter", default)]
    winter: Option<f64>,
    #[serde(rename = "Spring", default)]
    spring: Option<f64>,
}

impl ForecastRecord {
    /// Forecast value with negatives floored at 0.
    fn forecast(&self) -> f64 {
        self.value.max(0.0)
    }

    /// Season flags from the file, or from the MMWR week of the target date.
    fn seasons(&self) -> SeasonFlags {
        match (self.fall, self.winter, self.spring) {
            (Some(f), Some(w), Some(s)) => SeasonFlags::new(f > 0.5, w > 0.5, s > 0.5),
            _ => season_flags(self.date_predicted),
        }
    }
}

#[derive(Debug, Deserialize)]
struct LocationRecord {
    location: String,
    location_name: String,
    population: f64,
}

#[derive(Debug, Deserialize)]
struct TruthRecord {
    date: NaiveDate,
    location_name: String,
    value: f64,
    #[serde(default)]
    weekly_rate: Option<f64>,
}

fn read_records<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<Vec<T>, LoadError> {
    let file = File::open(path)
        .map_err(|e| LoadError::FileNotFound(format!("{}: {}", path.display(), e)))?;
    let mut reader = csv::Reader::from_reader(BufReader::new(file));

    let mut rows = Vec::new();
    for result in reader.deserialize() {
        let row: T =
            result.map_err(|e| LoadError::CsvError(format!("{}: {}", path.display(), e)))?;
        rows.push(row);
    }
    if rows.is_empty() {
        return Err(LoadError::NoRows(path.display().to_string()));
    }
    Ok(rows)
}

/// Load historical forecast errors as training samples.
pub fn load_training(path: &Path) -> Result<Vec<ResidualSample>, LoadError> {
    let records: Vec<ForecastRecord> = read_records(path)?;
    let samples: Vec<ResidualSample> = records
        .iter()
        .map(|r| {
            ResidualSample::new(
                r.location_name.clone(),
                r.horizon,
                r.forecast(),
                r.target_value,
                r.seasons(),
            )
        })
        .collect();
    tracing::info!(path = %path.display(), samples = samples.len(), "loaded forecast history");
    Ok(samples)
}

/// Load the current point forecasts.
pub fn load_forecasts(path: &Path) -> Result<Vec<PointForecast>, LoadError> {
    let records: Vec<ForecastRecord> = read_records(path)?;
    let forecasts: Vec<PointForecast> = records
        .iter()
        .map(|r| {
            PointForecast::new(
                r.location_name.clone(),
                r.horizon,
                r.date_predicted,
                r.forecast(),
            )
        })
        .collect();
    tracing::info!(path = %path.display(), forecasts = forecasts.len(), "loaded point forecasts");
    Ok(forecasts)
}

/// Load location codes and populations, keyed by location name, and attach
/// the observation reported on `truth_date` when a truth file is given.
pub fn load_locations(
    locations_path: &Path,
    truth: Option<(&Path, NaiveDate)>,
) -> Result<HashMap<String, LocationInfo>, LoadError> {
    let records: Vec<LocationRecord> = read_records(locations_path)?;
    let mut locations: HashMap<String, LocationInfo> = records
        .into_iter()
        .map(|r| (r.location_name, LocationInfo::new(r.location, r.population)))
        .collect();

    let Some((truth_path, truth_date)) = truth else {
        return Ok(locations);
    };

    let observations: Vec<TruthRecord> = read_records(truth_path)?;
    for obs in observations.into_iter().filter(|o| o.date == truth_date) {
        let Some(info) = locations.get_mut(&obs.location_name) else {
            tracing::debug!(location = %obs.location_name, "observation for unknown location");
            continue;
        };
        if info.last_observation.is_some() {
            return Err(LoadError::DuplicateObservation {
                location: obs.location_name,
                date: truth_date,
            });
        }
        let rate = obs
            .weekly_rate
            .unwrap_or(obs.value / info.population * 100_000.0);
        info.last_observation = Some(LastObservation::new(obs.value, rate));
    }

    let missing = locations
        .values()
        .filter(|info| info.last_observation.is_none())
        .count();
    if missing > 0 {
        tracing::warn!(missing, %truth_date, "locations without a last observation");
    }
    Ok(locations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn csv_file(lines: &[&str]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
        file
    }

    #[test]
    fn test_load_training_with_season_columns() {
        let file = csv_file(&[
            "date_predicted,location_name,model,value,target_value,horizon,Fall,Winter,Spring",
            "2023-01-07,Ohio,ens,120.5,130,3,0,1,0",
            "2023-01-14,Ohio,ens,-4,,3,0,1,0",
        ]);
        let samples = load_training(file.path()).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].truth, Some(130.0));
        assert!(samples[0].seasons.winter && !samples[0].seasons.fall);
        assert_eq!(samples[1].forecast, 0.0);
        assert_eq!(samples[1].truth, None);
    }

    #[test]
    fn test_load_training_derives_seasons() {
        let file = csv_file(&[
            "date_predicted,location_name,value,target_value,horizon",
            "2023-11-11,Ohio,80,95,2",
            "2024-03-30,Ohio,40,38,2",
        ]);
        let samples = load_training(file.path()).unwrap();
        assert_eq!(samples[0].seasons, SeasonFlags::new(true, false, false));
        assert_eq!(samples[1].seasons, SeasonFlags::new(false, false, true));
    }

    #[test]
    fn test_load_forecasts() {
        let file = csv_file(&[
            "date_predicted,location_name,value,horizon",
            "2023-11-18,Ohio,210.25,3",
        ]);
        let forecasts = load_forecasts(file.path()).unwrap();
        assert_eq!(
            forecasts,
            vec![PointForecast::new(
                "Ohio",
                3,
                NaiveDate::from_ymd_opt(2023, 11, 18).unwrap(),
                210.25
            )]
        );
    }

    #[test]
    fn test_load_locations_with_truth() {
        let locations = csv_file(&[
            "location,location_name,population",
            "06,California,39000000",
            "39,Ohio,11800000",
        ]);
        let truth = csv_file(&[
            "date,location,location_name,value,weekly_rate",
            "2023-10-21,06,California,300,0.77",
            "2023-10-28,06,California,350,0.9",
            "2023-10-28,39,Ohio,118,",
        ]);
        let date = NaiveDate::from_ymd_opt(2023, 10, 28).unwrap();
        let map = load_locations(locations.path(), Some((truth.path(), date))).unwrap();

        let ca = &map["California"];
        assert_eq!(ca.code, "06");
        assert_eq!(ca.last_observation, Some(LastObservation::new(350.0, 0.9)));
        let ohio = map["Ohio"].last_observation.unwrap();
        assert!((ohio.rate - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_duplicate_observation() {
        let locations = csv_file(&["location,location_name,population", "39,Ohio,11800000"]);
        let truth = csv_file(&[
            "date,location,location_name,value,weekly_rate",
            "2023-10-28,39,Ohio,118,1.0",
            "2023-10-28,39,Ohio,119,1.0",
        ]);
        let date = NaiveDate::from_ymd_opt(2023, 10, 28).unwrap();
        let err = load_locations(locations.path(), Some((truth.path(), date))).unwrap_err();
        assert!(matches!(err, LoadError::DuplicateObservation { .. }));
    }

    #[test]
    fn test_missing_file_and_empty_file() {
        let err = load_forecasts(Path::new("/nonexistent/preds.csv")).unwrap_err();
        assert!(matches!(err, LoadError::FileNotFound(_)));

        let empty = csv_file(&["date_predicted,location_name,value,horizon"]);
        let err = load_forecasts(empty.path()).unwrap_err();
        assert!(matches!(err, LoadError::NoRows(_)));
    }
}
