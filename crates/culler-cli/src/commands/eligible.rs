use std::io::Write;

use culler_core::{CullerConfig, Deployment, PolicySource, SelectionGroup};
use culler_eligible::eligible_instances;
use culler_term::Target;

/// Print the id of every instance currently eligible in `target`, one per line.
pub fn run(config: &CullerConfig, dep: &dyn Deployment, target: &Target, out: &mut dyn Write) -> anyhow::Result<()> {
    let policy = config.policies().policy(&target.service)?;
    let group = SelectionGroup::new(
        &target.service,
        &target.account,
        target.region.clone(),
        target.stack.clone(),
        target.cluster.clone(),
    )?;
    for instance in eligible_instances(&group, &policy.exceptions, &config.excluded_suffixes, dep)? {
        writeln!(out, "{}", instance.id)?;
    }
    Ok(())
}
