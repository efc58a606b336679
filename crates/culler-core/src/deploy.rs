//! In-memory deployment provider.
//!
//! `StaticDeployment` serves topology from a map, either built in code or
//! loaded from a JSON file shaped like:
//!
//! ```json
//! { "foo": { "prod": { "cloud_provider": "aws",
//!   "clusters": { "foo-prod": { "us-east-1": { "foo-prod-v001": ["i-1", "i-2"] } } } } } }
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use tracing::debug;

use crate::error::{DeployError, DeployResult};
use crate::names::Names;
use crate::topology::{
    AccountInfo, AsgName, ClusterMap, ClusterName, InstanceId, RegionName, Service, ServiceMap, ServiceName,
};
use crate::traits::Deployment;

#[derive(Debug, Clone, Default)]
pub struct StaticDeployment {
    services: BTreeMap<ServiceName, ServiceMap>,
}

impl StaticDeployment {
    pub fn new(services: BTreeMap<ServiceName, ServiceMap>) -> Self {
        Self { services }
    }

    /// Load a topology file.
    pub fn from_file(path: &Path) -> DeployResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| DeployError::Transport(format!("reading {}: {e}", path.display())))?;
        let services: BTreeMap<ServiceName, ServiceMap> =
            serde_json::from_str(&content).map_err(|e| DeployError::Parse(e.to_string()))?;
        debug!(path = %path.display(), services = services.len(), "topology loaded");
        Ok(Self { services })
    }

    /// Add (or re-tag) an account of a service.
    pub fn with_account(mut self, service: &str, account: &str, cloud_provider: &str) -> Self {
        self.services
            .entry(service.to_string())
            .or_default()
            .entry(account.to_string())
            .or_default()
            .cloud_provider = cloud_provider.to_string();
        self
    }

    /// Add an ASG. Accounts not registered with `with_account` are tagged `aws`.
    pub fn with_asg(
        mut self,
        service: &str,
        account: &str,
        cluster: &str,
        region: &str,
        asg: &str,
        ids: &[&str],
    ) -> Self {
        let info = self
            .services
            .entry(service.to_string())
            .or_default()
            .entry(account.to_string())
            .or_insert_with(|| AccountInfo {
                cloud_provider: "aws".to_string(),
                clusters: ClusterMap::new(),
            });
        info.clusters
            .entry(cluster.to_string())
            .or_default()
            .entry(region.to_string())
            .or_default()
            .insert(asg.to_string(), ids.iter().map(|id| id.to_string()).collect());
        self
    }

    fn service_map(&self, service: &str) -> DeployResult<&ServiceMap> {
        self.services
            .get(service)
            .ok_or_else(|| DeployError::NotFound(format!("service {service}")))
    }

    fn regions(
        &self,
        service: &str,
        account: &str,
        cluster: &str,
    ) -> DeployResult<&BTreeMap<RegionName, BTreeMap<AsgName, Vec<InstanceId>>>> {
        let info = self.service_map(service)?.get(account).ok_or_else(|| {
            DeployError::NotFound(format!("service {service} not deployed in account {account}"))
        })?;
        info.clusters.get(cluster).ok_or_else(|| {
            DeployError::NotFound(format!(
                "no cluster {cluster} in service {service}, account {account}"
            ))
        })
    }
}

/// The ASG with the highest push number; ties and unversioned names fall
/// back to name order.
fn active_asg(asgs: &BTreeMap<AsgName, Vec<InstanceId>>) -> Option<(&AsgName, &Vec<InstanceId>)> {
    asgs.iter()
        .max_by_key(|(name, _)| (Names::parse(name).ok().and_then(|n| n.push), *name))
}

impl Deployment for StaticDeployment {
    fn service_names(&self) -> DeployResult<Vec<ServiceName>> {
        Ok(self.services.keys().cloned().collect())
    }

    fn service(&self, name: &str) -> DeployResult<Service> {
        let data = self.service_map(name)?;
        Service::from_map(name, data).map_err(|e| DeployError::Parse(e.to_string()))
    }

    fn cluster_names(&self, service: &str, account: &str) -> DeployResult<Vec<ClusterName>> {
        Ok(self
            .service_map(service)?
            .get(account)
            .map(|info| info.clusters.keys().cloned().collect())
            .unwrap_or_default())
    }

    fn region_names(&self, service: &str, account: &str, cluster: &str) -> DeployResult<Vec<RegionName>> {
        Ok(self.regions(service, account, cluster)?.keys().cloned().collect())
    }

    fn cloud_provider(&self, account: &str) -> DeployResult<String> {
        self.services
            .values()
            .find_map(|accounts| accounts.get(account))
            .map(|info| info.cloud_provider.clone())
            .ok_or_else(|| DeployError::NotFound(format!("account {account}")))
    }

    fn instance_ids(
        &self,
        service: &str,
        account: &str,
        _cloud_provider: &str,
        region: &str,
        cluster: &str,
    ) -> DeployResult<(AsgName, Vec<InstanceId>)> {
        let asgs = self.regions(service, account, cluster)?.get(region).ok_or_else(|| {
            DeployError::NotFound(format!(
                "cluster {cluster} in account {account} not deployed in region {region}"
            ))
        })?;
        let (asg, ids) = active_asg(asgs).ok_or_else(|| {
            DeployError::NotFound(format!("cluster {cluster} has no ASG in region {region}"))
        })?;
        Ok((asg.clone(), ids.clone()))
    }
}
