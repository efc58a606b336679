//! Eligibility filter: resolve a selection group to candidate instances.

use culler_core::{Deployment, Exception, Instance, Names, NeverEligible, SelectionGroup};
use tracing::debug;

use crate::error::{EligibleError, EligibleResult};

/// Instances of `group` that may be terminated right now.
///
/// Walks every cluster of the group's (service, account), and for each
/// deployed region that survives the group's region pin, the exceptions,
/// the never-eligible suffixes and the group's stack/cluster scope, takes
/// the instances of the active ASG. Any topology lookup failure aborts the
/// whole computation.
pub fn eligible_instances(
    group: &SelectionGroup,
    exceptions: &[Exception],
    never: &NeverEligible,
    dep: &dyn Deployment,
) -> EligibleResult<Vec<Instance>> {
    let service = group.service();
    let account = group.account();

    let cloud_provider = dep
        .cloud_provider(account)
        .map_err(EligibleError::deploy(format!("cloud provider of account {account}")))?;

    let clusters = dep
        .cluster_names(service, account)
        .map_err(EligibleError::deploy(format!(
            "clusters of service {service} in account {account}"
        )))?;

    let mut result = Vec::new();
    for cluster in clusters {
        let names = Names::parse(&cluster)?;

        if never.matches(&cluster) {
            debug!(%cluster, "never eligible");
            continue;
        }

        let deployed = dep
            .region_names(service, account, &cluster)
            .map_err(EligibleError::deploy(format!(
                "regions of cluster {cluster} in account {account}"
            )))?;

        for region in candidate_regions(group, &deployed) {
            if is_exception(exceptions, account, &names, region) {
                debug!(%cluster, %region, "excepted");
                continue;
            }

            if !group.contains(account, region, &names) {
                continue;
            }

            let (asg, ids) = dep
                .instance_ids(service, account, &cloud_provider, region, &cluster)
                .map_err(EligibleError::deploy(format!(
                    "instances of cluster {cluster} in account {account}, region {region}"
                )))?;

            result.extend(ids.into_iter().map(|id| Instance {
                service: service.to_string(),
                account: account.to_string(),
                region: region.to_string(),
                stack: names.stack.clone(),
                detail: names.detail.clone(),
                cluster: cluster.clone(),
                asg: asg.clone(),
                id,
                cloud_provider: cloud_provider.clone(),
            }));
        }
    }

    debug!(%group, eligible = result.len(), "eligible instances");
    Ok(result)
}

/// The pinned region if the cluster is deployed there, otherwise every
/// deployed region.
fn candidate_regions<'a>(group: &SelectionGroup, deployed: &'a [String]) -> Vec<&'a str> {
    match group.region() {
        Some(pinned) => deployed
            .iter()
            .filter(|r| r.as_str() == pinned)
            .map(String::as_str)
            .collect(),
        None => deployed.iter().map(String::as_str).collect(),
    }
}

fn is_exception(exceptions: &[Exception], account: &str, names: &Names, region: &str) -> bool {
    exceptions
        .iter()
        .any(|ex| ex.matches(account, &names.stack, &names.detail, region))
}
