use std::sync::Arc;

use culler_core::{
    Checker, CullerConfig, Deployment, ErrorCounter, LeashedTerminator, LogTracker, StaticEnv, StaticOutage, Terminator,
};
use culler_term::{Orchestrator, Outcome, Settings, Target};
use tracing::{info, warn};

use crate::terminator::CommandTerminator;

/// Build the orchestrator from configuration.
pub fn orchestrator(
    config: &CullerConfig,
    dep: Arc<dyn Deployment>,
    checker: Arc<dyn Checker>,
) -> anyhow::Result<Orchestrator> {
    let settings = Settings::from_config(config)?;
    let terminator: Arc<dyn Terminator> = if settings.leashed {
        Arc::new(LeashedTerminator)
    } else {
        Arc::new(CommandTerminator::new(&config.terminator)?)
    };
    Ok(Orchestrator::new(
        settings,
        dep,
        Arc::new(config.policies()),
        checker,
        terminator,
    )
    .with_tracker(Arc::new(LogTracker))
    .with_outage(Arc::new(StaticOutage(config.outage)))
    .with_env(Arc::new(StaticEnv {
        in_test: config.in_test(),
    })))
}

/// Terminate one instance of `target`. Any failure bumps `errors` before
/// being returned.
pub fn run(
    config: &CullerConfig,
    dep: Arc<dyn Deployment>,
    checker: Arc<dyn Checker>,
    target: &Target,
    errors: &dyn ErrorCounter,
) -> anyhow::Result<Outcome> {
    let result = orchestrator(config, dep, checker).and_then(|orch| {
        orch.terminate(target, &mut rand::thread_rng())
            .map_err(anyhow::Error::from)
    });

    match result {
        Ok(outcome) => {
            if let Outcome::Terminated(term) = &outcome {
                info!(instance = %term.instance, leashed = term.leashed, "terminate done");
            }
            Ok(outcome)
        }
        Err(e) => {
            if let Err(counter_err) = errors.increment() {
                warn!(error = %counter_err, "could not increment error counter");
            }
            Err(e)
        }
    }
}
