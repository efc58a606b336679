//! Per-service termination policy, exceptions, and never-eligible clusters.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Wildcard value accepted by every exception field.
pub const WILDCARD: &str = "*";

/// How a service's instances are partitioned into selection groups.
///
/// Parsed through `FromStr`, so configuration accepts `app` as a synonym
/// for `service`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Grouping {
    /// One group per account (and region, when independent).
    Service,
    /// One group per stack.
    Stack,
    /// One group per cluster.
    #[default]
    Cluster,
}

impl FromStr for Grouping {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "service" | "app" => Ok(Grouping::Service),
            "stack" => Ok(Grouping::Stack),
            "cluster" => Ok(Grouping::Cluster),
            other => Err(ConfigError::UnknownGrouping(other.to_string())),
        }
    }
}

impl TryFrom<String> for Grouping {
    type Error = ConfigError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl std::fmt::Display for Grouping {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Grouping::Service => write!(f, "service"),
            Grouping::Stack => write!(f, "stack"),
            Grouping::Cluster => write!(f, "cluster"),
        }
    }
}

/// An opt-out rule. Each field is a literal or `*`.
///
/// `Exception { account: "test", stack: "*", detail: "*", region: "*" }`
/// opts out every cluster in the test account.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Exception {
    pub account: String,
    pub stack: String,
    pub detail: String,
    pub region: String,
}

impl Exception {
    pub fn new(account: &str, stack: &str, detail: &str, region: &str) -> Self {
        Self {
            account: account.to_string(),
            stack: stack.to_string(),
            detail: detail.to_string(),
            region: region.to_string(),
        }
    }

    pub fn matches(&self, account: &str, stack: &str, detail: &str, region: &str) -> bool {
        field_matches(&self.account, account)
            && field_matches(&self.stack, stack)
            && field_matches(&self.detail, detail)
            && field_matches(&self.region, region)
    }
}

fn field_matches(field: &str, value: &str) -> bool {
    field == WILDCARD || field == value
}

/// Termination policy for one service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Policy {
    pub enabled: bool,
    pub regions_are_independent: bool,
    pub grouping: Grouping,
    pub mean_time_between_fires_in_work_days: u32,
    /// Zero disables the minimum-time check.
    pub min_time_between_fires_in_work_days: u32,
    pub exceptions: Vec<Exception>,
    /// No longer honored. A service that still sets it is refused.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub whitelist: Option<Vec<Exception>>,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            enabled: true,
            regions_are_independent: true,
            grouping: Grouping::Cluster,
            mean_time_between_fires_in_work_days: 5,
            min_time_between_fires_in_work_days: 1,
            exceptions: Vec::new(),
            whitelist: None,
        }
    }
}

impl Policy {
    /// Reject values the scheduler cannot work with.
    pub fn validate(&self, service: &str) -> Result<(), ConfigError> {
        if self.mean_time_between_fires_in_work_days == 0 {
            return Err(ConfigError::NonPositiveMeanTime {
                service: service.to_string(),
            });
        }
        Ok(())
    }

    /// True when a deprecated whitelist is still configured.
    pub fn has_whitelist(&self) -> bool {
        self.whitelist.as_ref().is_some_and(|w| !w.is_empty())
    }
}

/// Cluster-name suffixes that are never terminated, regardless of policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NeverEligible {
    suffixes: Vec<String>,
}

impl Default for NeverEligible {
    fn default() -> Self {
        Self::new(["-canary", "-baseline", "-citrus", "-citrusproxy"])
    }
}

impl NeverEligible {
    pub fn new<I, S>(suffixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            suffixes: suffixes.into_iter().map(Into::into).collect(),
        }
    }

    pub fn matches(&self, cluster: &str) -> bool {
        self.suffixes.iter().any(|s| cluster.ends_with(s.as_str()))
    }
}
