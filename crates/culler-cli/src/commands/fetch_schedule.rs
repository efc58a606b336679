use std::io::Write;

use chrono::{DateTime, Utc};
use culler_core::CullerConfig;
use culler_state::StateStore;
use tracing::info;

use crate::commands::local_date;
use crate::cron;

/// Install the schedule published for today, if there is one.
///
/// Returns whether a schedule was installed.
pub fn run(config: &CullerConfig, store: &StateStore, now: DateTime<Utc>, out: &mut dyn Write) -> anyhow::Result<bool> {
    let date = local_date(config, now)?;
    let Some(mut schedule) = store.get_schedule(date)? else {
        info!(%date, "no schedule to retrieve");
        return Ok(false);
    };
    cron::install(config, &mut schedule, out)?;
    info!(%date, entries = schedule.len(), "schedule fetched");
    Ok(true)
}
