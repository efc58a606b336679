//! Orchestrator error types.

use culler_core::{GateError, GroupError};
use culler_eligible::EligibleError;
use thiserror::Error;

pub type TermResult<T> = Result<T, TermError>;

#[derive(Debug, Error)]
pub enum TermError {
    #[error("not terminating: culler may not run unleashed in the test environment")]
    UnleashedInTestEnv,

    /// The outage check itself failed; treated as "do not fire".
    #[error("not terminating: problem checking for an outage: {0}")]
    Outage(#[source] anyhow::Error),

    #[error("not terminating: {0}")]
    Group(#[from] GroupError),

    #[error("not terminating: could not retrieve policy for service {service}: {source}")]
    Policy {
        service: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("not terminating: {0}")]
    Eligibility(#[from] EligibleError),

    #[error("not terminating: check for min time between terminations failed: {0}")]
    Gate(#[from] GateError),

    #[error("not terminating: recording termination event failed: {0}")]
    Tracker(#[source] anyhow::Error),

    #[error("termination failed: {0}")]
    Terminator(#[source] anyhow::Error),
}

impl TermError {
    /// True when the gate refused because the group fired too recently.
    pub fn is_min_time_violation(&self) -> bool {
        matches!(self, TermError::Gate(e) if e.is_min_time_violation())
    }
}
