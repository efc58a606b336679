//! Error types shared across Culler crates.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use thiserror::Error;

/// Result type alias for deployment-provider lookups.
pub type DeployResult<T> = Result<T, DeployError>;

/// Errors raised by a deployment (topology) provider.
#[derive(Debug, Error)]
pub enum DeployError {
    #[error("transport error: {0}")]
    Transport(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("not found: {0}")]
    NotFound(String),
}

/// A cluster or ASG name that does not follow the naming convention.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid name {name:?}: does not match service[-stack[-detail]][-vNNN]")]
pub struct NameError {
    pub name: String,
}

/// Errors constructing a selection group.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GroupError {
    #[error("selection group may be scoped by stack ({stack}) or by cluster ({cluster}), not both")]
    StackAndCluster { stack: String, cluster: String },

    #[error("selection group requires a {0}")]
    MissingField(&'static str),
}

/// Configuration errors. These are fail-fast: never retried.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(String),

    #[error("unknown grouping mode: {0:?} (expected service, stack or cluster)")]
    UnknownGrouping(String),

    #[error("end_hour ({end}) must be greater than start_hour ({start})")]
    EmptyWindow { start: u32, end: u32 },

    #[error("hour out of range: {0} (expected 0..=24)")]
    HourOutOfRange(u32),

    #[error("unknown time zone: {0}")]
    UnknownTimeZone(String),

    #[error("service {service}: mean_time_between_fires_in_work_days must be positive")]
    NonPositiveMeanTime { service: String },
}

/// A termination that would fire sooner than the group's minimum time
/// between fires allows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViolatesMinTime {
    /// Instance terminated by the most recent counted fire.
    pub instance_id: String,
    /// When that fire happened.
    pub fired_at: DateTime<Utc>,
    /// Local time zone used for reporting, when known.
    pub tz: Option<Tz>,
}

impl std::fmt::Display for ViolatesMinTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "would violate min time between fires: instance {} was fired at {}",
            self.instance_id,
            self.fired_at.to_rfc3339()
        )?;
        if let Some(tz) = self.tz {
            write!(f, " ({})", self.fired_at.with_timezone(&tz).to_rfc3339())?;
        }
        Ok(())
    }
}

/// Outcomes of a termination gate check other than "permitted".
#[derive(Debug, Error)]
pub enum GateError {
    /// An earlier counted fire for the same group is inside the min-time window.
    #[error("{0}")]
    ViolatesMinTime(ViolatesMinTime),

    /// A concurrent check committed first or still holds the store; the
    /// caller may retry.
    #[error("concurrent termination check for group {group}: {reason}")]
    Conflict { group: String, reason: String },

    /// The gate's store failed.
    #[error("gate store error: {0}")]
    Store(String),
}

impl GateError {
    pub fn is_min_time_violation(&self) -> bool {
        matches!(self, GateError::ViolatesMinTime(_))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, GateError::Conflict { .. })
    }
}
