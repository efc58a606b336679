//! Collaborator interfaces consumed by the scheduler, the gate and the
//! termination orchestrator.
//!
//! Each collaborator is a small capability trait so deployments can plug in
//! their own topology source, trackers or terminator without the engine
//! knowing which one it talks to.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tracing::info;

use crate::error::{DeployResult, GateError};
use crate::policy::Policy;
use crate::topology::{AsgName, ClusterName, InstanceId, Instance, RegionName, Service, ServiceName};

/// Source of fleet topology.
pub trait Deployment: Send + Sync {
    /// Every service known to the provider.
    fn service_names(&self) -> DeployResult<Vec<ServiceName>>;

    /// Full topology of one service.
    fn service(&self, name: &str) -> DeployResult<Service>;

    fn cluster_names(&self, service: &str, account: &str) -> DeployResult<Vec<ClusterName>>;

    /// Regions where the cluster currently has a deployment.
    fn region_names(&self, service: &str, account: &str, cluster: &str) -> DeployResult<Vec<RegionName>>;

    fn cloud_provider(&self, account: &str) -> DeployResult<String>;

    /// The active ASG of a cluster in a region, with its instance ids.
    fn instance_ids(
        &self,
        service: &str,
        account: &str,
        cloud_provider: &str,
        region: &str,
        cluster: &str,
    ) -> DeployResult<(AsgName, Vec<InstanceId>)>;
}

/// Per-service policy lookup.
pub trait PolicySource: Send + Sync {
    fn policy(&self, service: &str) -> anyhow::Result<Policy>;
}

/// A decided termination: which instance, when, and whether it is leashed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Termination {
    pub instance: Instance,
    pub time: DateTime<Utc>,
    /// Tracked but not executed.
    pub leashed: bool,
}

/// Minimum-time-between-fires gate.
///
/// A successful check also records the termination, so two callers can
/// never both be permitted against the same prior state.
pub trait Checker: Send + Sync {
    fn check(&self, term: &Termination, policy: &Policy, end_hour: u32, tz: Tz) -> Result<(), GateError>;
}

/// Records termination events in an audit or tracking system.
pub trait Tracker: Send + Sync {
    fn track(&self, term: &Termination) -> anyhow::Result<()>;
}

/// Physically terminates an instance.
pub trait Terminator: Send + Sync {
    fn execute(&self, term: &Termination) -> anyhow::Result<()>;
}

/// Reports whether an outage is in progress.
pub trait Outage: Send + Sync {
    fn outage(&self) -> anyhow::Result<bool>;
}

/// Counts failed runs.
pub trait ErrorCounter: Send + Sync {
    fn increment(&self) -> anyhow::Result<()>;
}

/// The environment this process is deployed to.
pub trait Env: Send + Sync {
    fn in_test(&self) -> bool;
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Stand-in terminator for leashed runs: logs, never touches the instance.
#[derive(Debug, Clone, Copy, Default)]
pub struct LeashedTerminator;

impl Terminator for LeashedTerminator {
    fn execute(&self, term: &Termination) -> anyhow::Result<()> {
        info!(instance_id = %term.instance.id, leashed = true, "not terminating instance");
        Ok(())
    }
}

/// Emits one structured event per termination.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogTracker;

impl Tracker for LogTracker {
    fn track(&self, term: &Termination) -> anyhow::Result<()> {
        info!(
            service = %term.instance.service,
            account = %term.instance.account,
            region = %term.instance.region,
            cluster = %term.instance.cluster,
            asg = %term.instance.asg,
            instance_id = %term.instance.id,
            leashed = term.leashed,
            time = %term.time.to_rfc3339(),
            "termination"
        );
        Ok(())
    }
}

/// Outage flag fixed at construction.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticOutage(pub bool);

impl Outage for StaticOutage {
    fn outage(&self) -> anyhow::Result<bool> {
        Ok(self.0)
    }
}

/// Environment flag fixed at construction.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticEnv {
    pub in_test: bool,
}

impl Env for StaticEnv {
    fn in_test(&self) -> bool {
        self.in_test
    }
}

/// Error counter that only logs.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogErrorCounter;

impl ErrorCounter for LogErrorCounter {
    fn increment(&self) -> anyhow::Result<()> {
        tracing::warn!("culler run failed");
        Ok(())
    }
}
