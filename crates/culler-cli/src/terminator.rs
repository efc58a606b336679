//! Terminator that shells out to an operator-supplied program.

use std::process::Command;

use culler_core::{Termination, Terminator};
use tracing::info;

/// Runs `program [args..] <account> <region> <asg> <instance-id> <cloud-provider>`.
#[derive(Debug, Clone)]
pub struct CommandTerminator {
    program: String,
    args: Vec<String>,
}

impl CommandTerminator {
    /// `command` is the program followed by any fixed leading arguments.
    pub fn new(command: &[String]) -> anyhow::Result<Self> {
        let Some((program, args)) = command.split_first() else {
            anyhow::bail!("no terminator command configured");
        };
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }
}

impl Terminator for CommandTerminator {
    fn execute(&self, term: &Termination) -> anyhow::Result<()> {
        let ins = &term.instance;
        info!(program = %self.program, instance_id = %ins.id, region = %ins.region, "terminating instance");
        let status = Command::new(&self.program)
            .args(&self.args)
            .args([&ins.account, &ins.region, &ins.asg, &ins.id, &ins.cloud_provider])
            .status()
            .map_err(|e| anyhow::anyhow!("running {}: {e}", self.program))?;
        if !status.success() {
            anyhow::bail!("{} exited with {status}", self.program);
        }
        Ok(())
    }
}
