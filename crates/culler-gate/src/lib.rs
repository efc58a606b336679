//! culler-gate — the minimum-time-between-fires check.
//!
//! `TerminationGate` implements `Checker` on top of a `StateStore`. A check
//! reads the group's record, compares the most recent counted fire against
//! a cutoff `min_time_between_fires_in_work_days` work days back, and on
//! success commits the new fire with an optimistic version check. Of any
//! number of concurrent checks against the same prior state, at most one
//! commits; the rest see `GateError::Conflict`.
//!
//! ```text
//! check(term, policy, end_hour, tz)
//!   ├── SelectionGroup::for_instance(term.instance, policy)
//!   ├── StateStore::gate_record        (read, version N)
//!   ├── no_fires_since(..) cutoff      (latest fire >= cutoff → ViolatesMinTime)
//!   └── StateStore::commit_gate        (stored version != N → Conflict)
//! ```

pub mod cutoff;
pub mod gate;

pub use cutoff::no_fires_since;
pub use gate::TerminationGate;
