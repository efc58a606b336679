use std::io::Write;

use culler_core::{Deployment, Names};

/// Print the regions `cluster` is deployed in, one per line.
pub fn run(dep: &dyn Deployment, cluster: &str, account: &str, out: &mut dyn Write) -> anyhow::Result<()> {
    let names = Names::parse(cluster)?;
    for region in dep.region_names(&names.service, account, cluster)? {
        writeln!(out, "{region}")?;
    }
    Ok(())
}
