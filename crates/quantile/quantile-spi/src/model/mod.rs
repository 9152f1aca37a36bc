//! Model module containing data structures

mod estimator_key;
mod forecast_input;
mod residual_sample;
mod scalar_minimum;
mod season;
mod submission_row;
mod trend;

pub use estimator_key::EstimatorKey;
pub use forecast_input::{LastObservation, LocationInfo, PointForecast};
pub use residual_sample::ResidualSample;
pub use scalar_minimum::ScalarMinimum;
pub use season::{Season, SeasonFlags};
pub use submission_row::{OutputType, OutputTypeId, RowStatus, SubmissionRow, TargetType};
pub use trend::{RateThreshold, RateThresholdTable, TrendCategory, TrendProbabilities};
