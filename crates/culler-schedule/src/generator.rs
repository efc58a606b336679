//! Schedule generation.

use chrono::{DateTime, Utc};
use culler_core::{
    CullerConfig, Deployment, NeverEligible, Policy, PolicySource, RandomSource, Schedule, Service,
};
use culler_eligible::eligible_groups;
use tracing::{debug, info, warn};

use crate::error::{ScheduleError, ScheduleResult};
use crate::window::FireWindow;

/// Flip a coin biased to land on "fire" once every `mean` work days.
///
/// Fires when a uniform `[0, 1)` sample is at most `1 / mean`.
pub fn should_fire(mean_time_between_fires_in_work_days: u32, rng: &mut dyn RandomSource) -> ScheduleResult<bool> {
    if mean_time_between_fires_in_work_days == 0 {
        return Err(ScheduleError::NonPositiveMeanTime);
    }
    let p_fire = 1.0 / f64::from(mean_time_between_fires_in_work_days);
    let sample = rng.sample_unit();
    Ok(sample <= p_fire)
}

/// Builds one day's termination schedule.
#[derive(Debug, Clone)]
pub struct ScheduleGenerator {
    window: FireWindow,
    max_services: Option<usize>,
    never: NeverEligible,
}

impl ScheduleGenerator {
    pub fn new(window: FireWindow, never: NeverEligible) -> Self {
        Self {
            window,
            max_services: None,
            never,
        }
    }

    pub fn from_config(config: &CullerConfig) -> ScheduleResult<Self> {
        let window = FireWindow::from_config(config)?;
        Ok(Self {
            window,
            max_services: config.max_services,
            never: config.excluded_suffixes.clone(),
        })
    }

    /// Consider at most `max` services per run.
    pub fn with_max_services(mut self, max: usize) -> Self {
        self.max_services = Some(max);
        self
    }

    /// Add today's terminations for `services` (every service the
    /// deployment knows, when empty) to `schedule`.
    ///
    /// A service whose policy or topology can't be retrieved is logged and
    /// skipped. Every service attempted counts toward the maximum, skipped
    /// or not. An invalid policy aborts the run.
    pub fn populate(
        &self,
        schedule: &mut Schedule,
        dep: &dyn Deployment,
        policies: &dyn PolicySource,
        services: &[String],
        now: DateTime<Utc>,
        rng: &mut dyn RandomSource,
    ) -> ScheduleResult<()> {
        let discovered;
        let services = if services.is_empty() {
            discovered = dep.service_names().map_err(ScheduleError::ListServices)?;
            &discovered[..]
        } else {
            services
        };

        let max = self.max_services.unwrap_or(usize::MAX);
        for name in services.iter().take(max) {
            let policy = match policies.policy(name) {
                Ok(policy) => policy,
                Err(e) => {
                    warn!(service = %name, error = %e, "could not retrieve policy, skipping");
                    continue;
                }
            };

            if !policy.enabled {
                info!(service = %name, "disabled");
                continue;
            }

            let service = match dep.service(name) {
                Ok(service) => service,
                Err(e) => {
                    warn!(service = %name, error = %e, "could not retrieve topology, skipping");
                    continue;
                }
            };

            self.schedule_service(schedule, &service, &policy, now, rng)?;
        }

        Ok(())
    }

    fn schedule_service(
        &self,
        schedule: &mut Schedule,
        service: &Service,
        policy: &Policy,
        now: DateTime<Utc>,
        rng: &mut dyn RandomSource,
    ) -> ScheduleResult<()> {
        policy.validate(service.name())?;

        let groups = eligible_groups(service, policy, &self.never)?;
        if groups.is_empty() {
            info!(service = %service.name(), "no eligible groups");
        }

        let mean = policy.mean_time_between_fires_in_work_days;
        for group in groups {
            let fire = should_fire(mean, rng)?;
            debug!(%group, mean_time_between_fires = mean, fire, "fire decision");
            if fire {
                let time = self.window.choose_termination_time(now, rng)?;
                info!(%group, time = %time.to_rfc3339(), "scheduled");
                schedule.add(time, group);
            }
        }
        Ok(())
    }
}
