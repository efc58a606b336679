//! The terminate path.

use std::sync::Arc;

use chrono_tz::Tz;
use culler_core::{
    Checker, Clock, ConfigError, CullerConfig, Deployment, Env, Exception, GroupError, Instance, LeashedTerminator,
    NeverEligible, Outage, PolicySource, RandomSource, SelectionGroup, StaticEnv, StaticOutage, SystemClock,
    Termination, Terminator, Tracker,
};
use culler_eligible::eligible_instances;
use tracing::{info, warn};

use crate::error::{TermError, TermResult};

/// Process-wide switches the orchestrator consults before every fire.
#[derive(Debug, Clone)]
pub struct Settings {
    pub enabled: bool,
    pub leashed: bool,
    pub accounts: Vec<String>,
    pub end_hour: u32,
    pub tz: Tz,
    pub never: NeverEligible,
}

impl Settings {
    pub fn from_config(config: &CullerConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            enabled: config.enabled,
            leashed: config.leashed,
            accounts: config.accounts.clone(),
            end_hour: config.end_hour,
            tz: config.tz()?,
            never: config.excluded_suffixes.clone(),
        })
    }

    pub fn account_enabled(&self, account: &str) -> bool {
        self.accounts.iter().any(|a| a == account)
    }
}

/// What to fire at: a service in an account, optionally narrowed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Target {
    pub service: String,
    pub account: String,
    pub region: Option<String>,
    pub stack: Option<String>,
    pub cluster: Option<String>,
}

impl Target {
    pub fn new(service: &str, account: &str) -> Self {
        Self {
            service: service.to_string(),
            account: account.to_string(),
            ..Self::default()
        }
    }

    pub fn region(mut self, region: &str) -> Self {
        self.region = Some(region.to_string());
        self
    }

    pub fn stack(mut self, stack: &str) -> Self {
        self.stack = Some(stack.to_string());
        self
    }

    pub fn cluster(mut self, cluster: &str) -> Self {
        self.cluster = Some(cluster.to_string());
        self
    }

    fn group(&self) -> Result<SelectionGroup, GroupError> {
        SelectionGroup::new(
            &self.service,
            &self.account,
            self.region.clone(),
            self.stack.clone(),
            self.cluster.clone(),
        )
    }
}

/// Why a terminate call did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Disabled,
    Outage,
    AccountDisabled,
    ServiceDisabled,
    /// The service still carries a whitelist, which is no longer honored.
    Whitelist,
    NoEligibleInstances,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SkipReason::Disabled => "culler is disabled",
            SkipReason::Outage => "outage in progress",
            SkipReason::AccountDisabled => "account is not enabled",
            SkipReason::ServiceDisabled => "service is disabled",
            SkipReason::Whitelist => "service has a whitelist, which is no longer supported",
            SkipReason::NoEligibleInstances => "no eligible instances in group",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The gate permitted the fire, it was tracked and handed to the
    /// terminator (the leashed stand-in when `leashed`).
    Terminated(Termination),
    Skipped(SkipReason),
}

/// Ties eligibility, the gate, trackers and the terminator together.
pub struct Orchestrator {
    settings: Settings,
    deployment: Arc<dyn Deployment>,
    policies: Arc<dyn PolicySource>,
    checker: Arc<dyn Checker>,
    terminator: Arc<dyn Terminator>,
    trackers: Vec<Arc<dyn Tracker>>,
    outage: Arc<dyn Outage>,
    env: Arc<dyn Env>,
    clock: Arc<dyn Clock>,
}

impl Orchestrator {
    /// No trackers, no outage, not a test environment, wall clock.
    pub fn new(
        settings: Settings,
        deployment: Arc<dyn Deployment>,
        policies: Arc<dyn PolicySource>,
        checker: Arc<dyn Checker>,
        terminator: Arc<dyn Terminator>,
    ) -> Self {
        Self {
            settings,
            deployment,
            policies,
            checker,
            terminator,
            trackers: Vec::new(),
            outage: Arc::new(StaticOutage(false)),
            env: Arc::new(StaticEnv::default()),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_tracker(mut self, tracker: Arc<dyn Tracker>) -> Self {
        self.trackers.push(tracker);
        self
    }

    pub fn with_outage(mut self, outage: Arc<dyn Outage>) -> Self {
        self.outage = outage;
        self
    }

    pub fn with_env(mut self, env: Arc<dyn Env>) -> Self {
        self.env = env;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Terminate one randomly chosen eligible instance of `target`.
    pub fn terminate(&self, target: &Target, rng: &mut dyn RandomSource) -> TermResult<Outcome> {
        if !self.settings.enabled {
            return Ok(skip(SkipReason::Disabled, target));
        }

        if self.outage.outage().map_err(TermError::Outage)? {
            return Ok(skip(SkipReason::Outage, target));
        }

        if !self.settings.account_enabled(&target.account) {
            return Ok(skip(SkipReason::AccountDisabled, target));
        }

        let group = target.group()?;
        self.fire(&group, rng)
    }

    fn fire(&self, group: &SelectionGroup, rng: &mut dyn RandomSource) -> TermResult<Outcome> {
        let leashed = self.settings.leashed;
        if self.env.in_test() && !leashed {
            return Err(TermError::UnleashedInTestEnv);
        }

        let service = group.service();
        let policy = self.policies.policy(service).map_err(|source| TermError::Policy {
            service: service.to_string(),
            source,
        })?;

        if !policy.enabled {
            info!(%group, "not terminating: service is disabled");
            return Ok(Outcome::Skipped(SkipReason::ServiceDisabled));
        }
        if policy.has_whitelist() {
            warn!(%group, "not terminating: whitelist is no longer supported");
            return Ok(Outcome::Skipped(SkipReason::Whitelist));
        }

        let Some(instance) = self.pick(group, &policy.exceptions, rng)? else {
            info!(%group, "no eligible instances in group, nothing to terminate");
            return Ok(Outcome::Skipped(SkipReason::NoEligibleInstances));
        };
        info!(%instance, "picked");

        let term = Termination {
            instance,
            time: self.clock.now(),
            leashed,
        };

        self.checker
            .check(&term, &policy, self.settings.end_hour, self.settings.tz)?;

        for tracker in &self.trackers {
            tracker.track(&term).map_err(TermError::Tracker)?;
        }

        let executed = if leashed {
            LeashedTerminator.execute(&term)
        } else {
            self.terminator.execute(&term)
        };
        executed.map_err(TermError::Terminator)?;

        Ok(Outcome::Terminated(term))
    }

    /// One eligible instance, uniformly at random.
    fn pick(
        &self,
        group: &SelectionGroup,
        exceptions: &[Exception],
        rng: &mut dyn RandomSource,
    ) -> TermResult<Option<Instance>> {
        let mut instances = eligible_instances(group, exceptions, &self.settings.never, self.deployment.as_ref())?;
        if instances.is_empty() {
            return Ok(None);
        }
        let index = rng.sample_below(instances.len());
        Ok(Some(instances.swap_remove(index)))
    }
}

fn skip(reason: SkipReason, target: &Target) -> Outcome {
    info!(service = %target.service, account = %target.account, %reason, "not terminating");
    Outcome::Skipped(reason)
}
