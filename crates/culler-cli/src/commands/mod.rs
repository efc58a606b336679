pub mod eligible;
pub mod fetch_schedule;
pub mod regions;
pub mod schedule;
pub mod terminate;

use chrono::{DateTime, NaiveDate, Utc};
use culler_core::CullerConfig;

/// The calendar date of `now` in the configured time zone.
pub fn local_date(config: &CullerConfig, now: DateTime<Utc>) -> anyhow::Result<NaiveDate> {
    Ok(now.with_timezone(&config.tz()?).date_naive())
}
