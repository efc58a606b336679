//! culler-eligible — who may be terminated.
//!
//! # Components
//!
//! - **`groups`**: Partition a service into selection groups per policy
//! - **`instances`**: Resolve a group to its eligible instances, applying
//!   exceptions and never-eligible clusters
//!
//! Neither component looks at past terminations; the minimum time between
//! fires is enforced later by the termination gate.

pub mod error;
pub mod groups;
pub mod instances;

pub use error::{EligibleError, EligibleResult};
pub use groups::eligible_groups;
pub use instances::eligible_instances;
