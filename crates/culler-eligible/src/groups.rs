//! Grouping engine: partition a service into selection groups.
//!
//! The grouping mode (service, stack, cluster) picks the scope of each
//! group; region independence decides whether that scope is split per
//! region. Together that is six enumeration strategies:
//!
//! | grouping | independent regions            | coupled regions         |
//! |----------|--------------------------------|-------------------------|
//! | service  | (account, region)              | (account)               |
//! | stack    | (account, stack, region)       | (account, stack)        |
//! | cluster  | (account, cluster, region)     | (account, cluster)      |
//!
//! Every cluster with at least one instance contributes its scopes; the
//! result is deduplicated, so clusters sharing a stack (or an account)
//! collapse into one group.

use std::collections::BTreeSet;

use culler_core::{Grouping, NeverEligible, Policy, SelectionGroup, Service};
use tracing::debug;

use crate::error::{EligibleError, EligibleResult};

/// Groups of `service` that each contain at least one instance, sorted
/// and unique.
///
/// Clusters that are never eligible are left out, so a group is never
/// built around instances that can't be terminated. Minimum time between
/// fires is not considered here.
pub fn eligible_groups(
    service: &Service,
    policy: &Policy,
    never: &NeverEligible,
) -> EligibleResult<Vec<SelectionGroup>> {
    if !policy.enabled {
        return Err(EligibleError::ServiceDisabled {
            service: service.name().to_string(),
        });
    }

    let name = service.name();
    let mut groups = BTreeSet::new();

    for account in service.accounts() {
        for cluster in service.clusters_of(account.id) {
            if never.matches(&cluster.name) {
                debug!(cluster = %cluster.name, "never eligible, not grouped");
                continue;
            }

            let regions = service.cluster_regions(cluster.id);
            if regions.is_empty() {
                continue;
            }

            let scopes: Vec<Option<&str>> = if policy.regions_are_independent {
                regions.into_iter().map(Some).collect()
            } else {
                vec![None]
            };

            for region in scopes {
                let group = match policy.grouping {
                    Grouping::Service => SelectionGroup::for_service(name, &account.name, region),
                    Grouping::Stack => {
                        SelectionGroup::for_stack(name, &account.name, region, &cluster.stack)
                    }
                    Grouping::Cluster => {
                        SelectionGroup::for_cluster(name, &account.name, region, &cluster.name)
                    }
                };
                groups.insert(group);
            }
        }
    }

    debug!(
        service = %name,
        grouping = %policy.grouping,
        regions_are_independent = policy.regions_are_independent,
        groups = groups.len(),
        "eligible groups"
    );
    Ok(groups.into_iter().collect())
}
