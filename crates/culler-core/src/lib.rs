//! culler-core — shared types for the Culler termination scheduler.
//!
//! Holds the in-memory fleet topology (an arena of flat records indexed by
//! id), selection groups, per-service policies, the schedule wire format,
//! the collaborator traits the engine consumes, and `culler.toml` parsing.

pub mod config;
pub mod deploy;
pub mod error;
pub mod group;
pub mod names;
pub mod policy;
pub mod random;
pub mod schedule;
pub mod topology;
pub mod traits;

pub use config::{CullerConfig, PolicyOverride, ServicePolicies};
pub use deploy::StaticDeployment;
pub use error::{ConfigError, DeployError, DeployResult, GateError, GroupError, NameError, ViolatesMinTime};
pub use group::SelectionGroup;
pub use names::Names;
pub use policy::{Exception, Grouping, NeverEligible, Policy};
pub use random::{RandomSource, ScriptedSource};
pub use schedule::{Entry, Schedule};
pub use topology::*;
pub use traits::*;
