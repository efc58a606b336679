use std::io::Write;

use chrono::{DateTime, Utc};
use culler_core::{CullerConfig, Deployment, RandomSource, Schedule};
use culler_schedule::ScheduleGenerator;
use culler_state::StateStore;
use tracing::info;

use crate::commands::local_date;
use crate::cron;

/// Generate today's schedule, publish it to the store and install it.
pub fn run(
    config: &CullerConfig,
    dep: &dyn Deployment,
    store: &StateStore,
    services: &[String],
    now: DateTime<Utc>,
    rng: &mut dyn RandomSource,
    out: &mut dyn Write,
) -> anyhow::Result<Schedule> {
    let mut schedule = Schedule::new();
    if !config.enabled {
        info!("culler is disabled, not generating a schedule");
        return Ok(schedule);
    }

    let generator = ScheduleGenerator::from_config(config)?;
    generator.populate(&mut schedule, dep, &config.policies(), services, now, rng)?;
    schedule.sort_by_time();

    let date = local_date(config, now)?;
    store.put_schedule(date, &schedule)?;
    info!(%date, entries = schedule.len(), "schedule published");

    cron::install(config, &mut schedule, out)?;
    Ok(schedule)
}
