//! culler-term — fire one instance, now.
//!
//! The `Orchestrator` runs the on-demand terminate path that each crontab
//! line invokes. Every negative signal along the way short-circuits into a
//! `SkipReason`; only genuine failures become a `TermError`.
//!
//! ```text
//! Orchestrator::terminate(target)
//!   ├── enabled? outage? account enabled?       → Skipped
//!   ├── SelectionGroup from target
//!   ├── leashed / test-environment safety rule  → UnleashedInTestEnv
//!   ├── PolicySource (disabled, whitelist)      → Skipped
//!   ├── eligible_instances, pick one at random  → Skipped when empty
//!   ├── Checker::check                          (min time between fires)
//!   ├── Tracker::track  × N
//!   └── Terminator::execute                     (LeashedTerminator when leashed)
//! ```

pub mod error;
pub mod orchestrator;

pub use error::{TermError, TermResult};
pub use orchestrator::{Orchestrator, Outcome, Settings, SkipReason, Target};
