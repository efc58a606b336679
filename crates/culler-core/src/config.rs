//! culler.toml configuration parser.
//!
//! ```toml
//! enabled = true
//! leashed = false
//! accounts = ["prod", "test"]
//! start_hour = 9
//! end_hour = 15
//! time_zone = "America/Los_Angeles"
//!
//! [defaults]
//! grouping = "cluster"
//! mean_time_between_fires_in_work_days = 5
//!
//! [services.foo]
//! grouping = "stack"
//! exceptions = [{ account = "test", stack = "*", detail = "*", region = "*" }]
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::policy::{Exception, Grouping, NeverEligible, Policy};
use crate::traits::PolicySource;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CullerConfig {
    /// Master switch for terminations.
    pub enabled: bool,
    /// Track terminations without executing them.
    pub leashed: bool,
    /// Install the generated crontab instead of printing it.
    pub schedule_enabled: bool,
    /// Accounts terminations are allowed in.
    pub accounts: Vec<String>,
    pub start_hour: u32,
    pub end_hour: u32,
    /// IANA time zone the daily window and the min-time cutoff are in.
    pub time_zone: String,
    /// Upper bound on services considered per scheduling run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_services: Option<usize>,
    /// Command the crontab invokes per entry.
    pub term_path: String,
    /// Cron user that runs the termination command.
    pub term_account: String,
    pub cron_path: PathBuf,
    /// `test` marks a test deployment, which may only run leashed.
    pub environment: String,
    pub outage: bool,
    pub excluded_suffixes: NeverEligible,
    pub store_path: PathBuf,
    pub topology_path: PathBuf,
    /// Program and leading arguments for real terminations. The instance's
    /// account, region, ASG, id and cloud provider are appended.
    pub terminator: Vec<String>,
    pub defaults: Policy,
    pub services: BTreeMap<String, PolicyOverride>,
}

impl Default for CullerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            leashed: true,
            schedule_enabled: false,
            accounts: Vec::new(),
            start_hour: 9,
            end_hour: 15,
            time_zone: "America/Los_Angeles".to_string(),
            max_services: None,
            term_path: "/usr/local/bin/culler terminate".to_string(),
            term_account: "root".to_string(),
            cron_path: PathBuf::from("/etc/cron.d/culler"),
            environment: "prod".to_string(),
            outage: false,
            excluded_suffixes: NeverEligible::default(),
            store_path: PathBuf::from("/var/lib/culler/culler.redb"),
            topology_path: PathBuf::from("/etc/culler/topology.json"),
            terminator: Vec::new(),
            defaults: Policy::default(),
            services: BTreeMap::new(),
        }
    }
}

/// Per-service policy fields; anything unset falls back to `[defaults]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyOverride {
    pub enabled: Option<bool>,
    pub regions_are_independent: Option<bool>,
    pub grouping: Option<Grouping>,
    pub mean_time_between_fires_in_work_days: Option<u32>,
    pub min_time_between_fires_in_work_days: Option<u32>,
    pub exceptions: Option<Vec<Exception>>,
    pub whitelist: Option<Vec<Exception>>,
}

impl PolicyOverride {
    fn apply(&self, base: &Policy) -> Policy {
        Policy {
            enabled: self.enabled.unwrap_or(base.enabled),
            regions_are_independent: self
                .regions_are_independent
                .unwrap_or(base.regions_are_independent),
            grouping: self.grouping.unwrap_or(base.grouping),
            mean_time_between_fires_in_work_days: self
                .mean_time_between_fires_in_work_days
                .unwrap_or(base.mean_time_between_fires_in_work_days),
            min_time_between_fires_in_work_days: self
                .min_time_between_fires_in_work_days
                .unwrap_or(base.min_time_between_fires_in_work_days),
            exceptions: self
                .exceptions
                .clone()
                .unwrap_or_else(|| base.exceptions.clone()),
            whitelist: self.whitelist.clone().or_else(|| base.whitelist.clone()),
        }
    }
}

impl CullerConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: CullerConfig =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for hour in [self.start_hour, self.end_hour] {
            if hour > 24 {
                return Err(ConfigError::HourOutOfRange(hour));
            }
        }
        if self.end_hour <= self.start_hour {
            return Err(ConfigError::EmptyWindow {
                start: self.start_hour,
                end: self.end_hour,
            });
        }
        self.tz()?;
        self.defaults.validate("defaults")?;
        for (name, overrides) in &self.services {
            overrides.apply(&self.defaults).validate(name)?;
        }
        Ok(())
    }

    pub fn tz(&self) -> Result<Tz, ConfigError> {
        self.time_zone
            .parse::<Tz>()
            .map_err(|_| ConfigError::UnknownTimeZone(self.time_zone.clone()))
    }

    pub fn account_enabled(&self, account: &str) -> bool {
        self.accounts.iter().any(|a| a == account)
    }

    pub fn in_test(&self) -> bool {
        self.environment == "test"
    }

    /// Policy lookup backed by `[defaults]` and `[services.*]`.
    pub fn policies(&self) -> ServicePolicies {
        ServicePolicies {
            defaults: self.defaults.clone(),
            services: self.services.clone(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ServicePolicies {
    defaults: Policy,
    services: BTreeMap<String, PolicyOverride>,
}

impl ServicePolicies {
    pub fn new(defaults: Policy) -> Self {
        Self {
            defaults,
            services: BTreeMap::new(),
        }
    }

    pub fn with_service(mut self, name: &str, overrides: PolicyOverride) -> Self {
        self.services.insert(name.to_string(), overrides);
        self
    }

    pub fn resolve(&self, service: &str) -> Policy {
        match self.services.get(service) {
            Some(overrides) => overrides.apply(&self.defaults),
            None => self.defaults.clone(),
        }
    }
}

impl PolicySource for ServicePolicies {
    fn policy(&self, service: &str) -> anyhow::Result<Policy> {
        let policy = self.resolve(service);
        policy.validate(service)?;
        Ok(policy)
    }
}
