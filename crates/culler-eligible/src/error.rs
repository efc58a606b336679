//! Error types for grouping and eligibility.

use culler_core::{DeployError, NameError};
use thiserror::Error;

pub type EligibleResult<T> = Result<T, EligibleError>;

#[derive(Debug, Error)]
pub enum EligibleError {
    /// Groups were requested for a service whose policy disables it.
    #[error("service {service} is disabled")]
    ServiceDisabled { service: String },

    #[error("{context}: {source}")]
    Deploy {
        context: String,
        #[source]
        source: DeployError,
    },

    #[error(transparent)]
    Name(#[from] NameError),
}

impl EligibleError {
    pub(crate) fn deploy(context: impl Into<String>) -> impl FnOnce(DeployError) -> Self {
        let context = context.into();
        move |source| EligibleError::Deploy { context, source }
    }
}
