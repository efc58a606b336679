//! Fleet topology for one service.
//!
//! A `Service` is an arena: accounts, clusters, ASGs and instances live in
//! flat vectors and refer to their parent by index. Navigation goes through
//! the owning `Service` instead of back-pointers, so a topology is plain
//! owned data that can be rebuilt for every scheduling or termination pass.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::NameError;
use crate::names::Names;

/// Name of a service (the `service` part of `service-stack-detail`).
pub type ServiceName = String;

/// Name of a cloud account, e.g. `prod` or `test`.
pub type AccountName = String;

/// Full `service-stack-detail` cluster name.
pub type ClusterName = String;

/// Region name, e.g. `us-east-1`.
pub type RegionName = String;

/// `service-stack-detail-vNNN` ASG name.
pub type AsgName = String;

/// Instance id, e.g. `i-0a1b2c3d` or a container uuid.
pub type InstanceId = String;

/// Cluster name → region → ASG name → instance ids.
pub type ClusterMap = BTreeMap<ClusterName, BTreeMap<RegionName, BTreeMap<AsgName, Vec<InstanceId>>>>;

/// Deployment data for one account of a service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccountInfo {
    pub cloud_provider: String,
    #[serde(default)]
    pub clusters: ClusterMap,
}

/// Account name → account data. The raw shape a service is built from.
pub type ServiceMap = BTreeMap<AccountName, AccountInfo>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccountId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClusterId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AsgId(usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: AccountId,
    pub name: AccountName,
    pub cloud_provider: String,
    clusters: Vec<ClusterId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cluster {
    pub id: ClusterId,
    pub account: AccountId,
    pub name: ClusterName,
    pub stack: String,
    pub detail: String,
    asgs: Vec<AsgId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asg {
    pub id: AsgId,
    pub cluster: ClusterId,
    pub name: AsgName,
    pub region: RegionName,
    pub instance_ids: Vec<InstanceId>,
}

impl Asg {
    pub fn is_empty(&self) -> bool {
        self.instance_ids.is_empty()
    }
}

/// A terminable unit with its full naming context.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Instance {
    pub service: ServiceName,
    pub account: AccountName,
    pub region: RegionName,
    pub stack: String,
    pub detail: String,
    pub cluster: ClusterName,
    pub asg: AsgName,
    pub id: InstanceId,
    pub cloud_provider: String,
}

impl std::fmt::Display for Instance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "service={} account={} region={} stack={} cluster={} asg={} instance-id={}",
            self.service, self.account, self.region, self.stack, self.cluster, self.asg, self.id
        )
    }
}

/// One service's deployed topology.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Service {
    name: ServiceName,
    accounts: Vec<Account>,
    clusters: Vec<Cluster>,
    asgs: Vec<Asg>,
}

impl Service {
    /// Build the arena from raw deployment data.
    ///
    /// Fails if any cluster name does not follow the naming convention.
    pub fn from_map(name: &str, data: &ServiceMap) -> Result<Self, NameError> {
        let mut service = Self {
            name: name.to_string(),
            accounts: Vec::new(),
            clusters: Vec::new(),
            asgs: Vec::new(),
        };

        for (account_name, info) in data {
            let account_id = AccountId(service.accounts.len());
            let mut account = Account {
                id: account_id,
                name: account_name.clone(),
                cloud_provider: info.cloud_provider.clone(),
                clusters: Vec::new(),
            };

            for (cluster_name, regions) in &info.clusters {
                let names = Names::parse(cluster_name)?;
                let cluster_id = ClusterId(service.clusters.len());
                let mut cluster = Cluster {
                    id: cluster_id,
                    account: account_id,
                    name: cluster_name.clone(),
                    stack: names.stack,
                    detail: names.detail,
                    asgs: Vec::new(),
                };

                for (region, asgs) in regions {
                    for (asg_name, ids) in asgs {
                        let asg_id = AsgId(service.asgs.len());
                        service.asgs.push(Asg {
                            id: asg_id,
                            cluster: cluster_id,
                            name: asg_name.clone(),
                            region: region.clone(),
                            instance_ids: ids.clone(),
                        });
                        cluster.asgs.push(asg_id);
                    }
                }

                service.clusters.push(cluster);
                account.clusters.push(cluster_id);
            }

            service.accounts.push(account);
        }

        Ok(service)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    pub fn account(&self, id: AccountId) -> &Account {
        &self.accounts[id.0]
    }

    pub fn cluster(&self, id: ClusterId) -> &Cluster {
        &self.clusters[id.0]
    }

    pub fn asg(&self, id: AsgId) -> &Asg {
        &self.asgs[id.0]
    }

    /// Clusters deployed in an account.
    pub fn clusters_of(&self, account: AccountId) -> impl Iterator<Item = &Cluster> {
        self.account(account).clusters.iter().map(|id| self.cluster(*id))
    }

    /// ASGs of a cluster across all regions.
    pub fn asgs_of(&self, cluster: ClusterId) -> impl Iterator<Item = &Asg> {
        self.cluster(cluster).asgs.iter().map(|id| self.asg(*id))
    }

    /// Regions where a cluster has at least one instance.
    pub fn cluster_regions(&self, cluster: ClusterId) -> BTreeSet<&str> {
        self.asgs_of(cluster)
            .filter(|asg| !asg.is_empty())
            .map(|asg| asg.region.as_str())
            .collect()
    }
}
