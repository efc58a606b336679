//! Error types for schedule generation.

use chrono::NaiveDate;
use chrono_tz::Tz;
use culler_core::{ConfigError, DeployError};
use culler_eligible::EligibleError;
use thiserror::Error;

pub type ScheduleResult<T> = Result<T, ScheduleError>;

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("mean time between fires must be positive")]
    NonPositiveMeanTime,

    #[error("could not retrieve list of services: {0}")]
    ListServices(#[source] DeployError),

    #[error(transparent)]
    Eligible(#[from] EligibleError),

    /// The window start falls in a daylight-saving gap.
    #[error("{hour}:00 does not exist on {date} in {tz}")]
    NonexistentLocalTime { date: NaiveDate, hour: u32, tz: Tz },
}
