//! Selection groups: the unit of "one random termination per period".

use serde::{Deserialize, Serialize};

use crate::error::GroupError;
use crate::names::Names;
use crate::policy::{Grouping, Policy};
use crate::topology::Instance;

/// A partial key over a service's instances.
///
/// `region`, `stack` and `cluster` are optional; an absent field matches
/// anything. A group is scoped by stack or by cluster, never both. Equality
/// is structural: absent fields must be absent on both sides.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawGroup")]
pub struct SelectionGroup {
    service: String,
    account: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stack: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cluster: Option<String>,
}

/// Wire shape accepted on input; validated into a `SelectionGroup`.
#[derive(Deserialize)]
struct RawGroup {
    service: String,
    account: String,
    #[serde(default)]
    region: Option<String>,
    #[serde(default)]
    stack: Option<String>,
    #[serde(default)]
    cluster: Option<String>,
}

impl TryFrom<RawGroup> for SelectionGroup {
    type Error = GroupError;

    fn try_from(raw: RawGroup) -> Result<Self, Self::Error> {
        SelectionGroup::new(&raw.service, &raw.account, raw.region, raw.stack, raw.cluster)
    }
}

/// Empty strings mean "absent".
fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl SelectionGroup {
    /// Build a group from loosely-typed parameters (e.g. command-line flags).
    pub fn new(
        service: &str,
        account: &str,
        region: Option<String>,
        stack: Option<String>,
        cluster: Option<String>,
    ) -> Result<Self, GroupError> {
        if service.is_empty() {
            return Err(GroupError::MissingField("service"));
        }
        if account.is_empty() {
            return Err(GroupError::MissingField("account"));
        }
        let (region, stack, cluster) = (present(region), present(stack), present(cluster));
        if let (Some(stack), Some(cluster)) = (&stack, &cluster) {
            return Err(GroupError::StackAndCluster {
                stack: stack.clone(),
                cluster: cluster.clone(),
            });
        }
        Ok(Self {
            service: service.to_string(),
            account: account.to_string(),
            region,
            stack,
            cluster,
        })
    }

    /// Group covering a whole service in an account, optionally pinned to a region.
    pub fn for_service(service: &str, account: &str, region: Option<&str>) -> Self {
        Self {
            service: service.to_string(),
            account: account.to_string(),
            region: present(region.map(str::to_string)),
            stack: None,
            cluster: None,
        }
    }

    /// Group covering one stack, optionally pinned to a region. A cluster
    /// without a stack yields the service-wide group.
    pub fn for_stack(service: &str, account: &str, region: Option<&str>, stack: &str) -> Self {
        Self {
            stack: present(Some(stack.to_string())),
            ..Self::for_service(service, account, region)
        }
    }

    /// Group covering one cluster, optionally pinned to a region.
    pub fn for_cluster(service: &str, account: &str, region: Option<&str>, cluster: &str) -> Self {
        Self {
            cluster: present(Some(cluster.to_string())),
            ..Self::for_service(service, account, region)
        }
    }

    /// The group an instance's termination is counted against under `policy`.
    ///
    /// Mirrors how the grouping engine partitions the service, so the gate
    /// compares fires within the same scope the scheduler fired them in.
    pub fn for_instance(instance: &Instance, policy: &Policy) -> Self {
        let region = policy
            .regions_are_independent
            .then_some(instance.region.as_str());
        match policy.grouping {
            Grouping::Service => Self::for_service(&instance.service, &instance.account, region),
            Grouping::Stack => {
                Self::for_stack(&instance.service, &instance.account, region, &instance.stack)
            }
            Grouping::Cluster => {
                Self::for_cluster(&instance.service, &instance.account, region, &instance.cluster)
            }
        }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    pub fn stack(&self) -> Option<&str> {
        self.stack.as_deref()
    }

    pub fn cluster(&self) -> Option<&str> {
        self.cluster.as_deref()
    }

    /// Whether `(account, region, cluster)` falls inside this group.
    pub fn contains(&self, account: &str, region: &str, names: &Names) -> bool {
        names.service == self.service
            && account == self.account
            && self.region.as_deref().is_none_or(|r| r == region)
            && self.stack.as_deref().is_none_or(|s| s == names.stack)
            && self.cluster.as_deref().is_none_or(|c| c == names.cluster)
    }

    /// Stable store key: `service/account/region/stack/cluster` with `*`
    /// standing in for absent fields.
    pub fn table_key(&self) -> String {
        let or_any = |v: &Option<String>| v.clone().unwrap_or_else(|| "*".to_string());
        format!(
            "{}/{}/{}/{}/{}",
            self.service,
            self.account,
            or_any(&self.region),
            or_any(&self.stack),
            or_any(&self.cluster)
        )
    }
}

impl std::fmt::Display for SelectionGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "service={} account={}", self.service, self.account)?;
        if let Some(region) = &self.region {
            write!(f, " region={region}")?;
        }
        if let Some(stack) = &self.stack {
            write!(f, " stack={stack}")?;
        }
        if let Some(cluster) = &self.cluster {
            write!(f, " cluster={cluster}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instance() -> Instance {
        Instance {
            service: "myapp".to_string(),
            account: "prod".to_string(),
            region: "us-east-1".to_string(),
            stack: "mystack".to_string(),
            detail: "mydetail".to_string(),
            cluster: "myapp-mystack-mydetail".to_string(),
            asg: "myapp-mystack-mydetail-v123".to_string(),
            id: "i-a96a0166".to_string(),
            cloud_provider: "aws".to_string(),
        }
    }

    #[test]
    fn new_with_region_only() {
        let group = SelectionGroup::new("myapp", "prod", Some("us-east-1".into()), None, None).unwrap();
        assert_eq!(group.service(), "myapp");
        assert_eq!(group.account(), "prod");
        assert_eq!(group.region(), Some("us-east-1"));
        assert_eq!(group.stack(), None);
        assert_eq!(group.cluster(), None);
    }

    #[test]
    fn empty_strings_are_absent() {
        let group =
            SelectionGroup::new("myapp", "prod", Some(String::new()), Some(String::new()), None).unwrap();
        assert_eq!(group, SelectionGroup::for_service("myapp", "prod", None));
    }

    #[test]
    fn stackless_cluster_groups_by_service() {
        let group = SelectionGroup::for_stack("foo", "prod", Some("us-east-1"), "");
        assert_eq!(group, SelectionGroup::for_service("foo", "prod", Some("us-east-1")));
        assert_eq!(group.stack(), None);
        assert_eq!(SelectionGroup::for_cluster("foo", "prod", Some(""), "").table_key(), "foo/prod/*/*/*");

        let json = serde_json::to_string(&group).unwrap();
        assert_eq!(json, r#"{"service":"foo","account":"prod","region":"us-east-1"}"#);
        assert_eq!(serde_json::from_str::<SelectionGroup>(&json).unwrap(), group);
    }

    #[test]
    fn stack_and_cluster_are_exclusive() {
        let err = SelectionGroup::new(
            "myapp",
            "prod",
            None,
            Some("staging".into()),
            Some("myapp-staging".into()),
        )
        .unwrap_err();
        assert!(matches!(err, GroupError::StackAndCluster { .. }));
    }

    #[test]
    fn equality_distinguishes_absent_from_present() {
        let cross_region = SelectionGroup::for_service("myapp", "prod", None);
        let pinned = SelectionGroup::for_service("myapp", "prod", Some("us-east-1"));
        assert_ne!(cross_region, pinned);
        assert_eq!(pinned, SelectionGroup::for_service("myapp", "prod", Some("us-east-1")));
        assert_ne!(
            SelectionGroup::for_stack("myapp", "prod", None, "x"),
            SelectionGroup::for_cluster("myapp", "prod", None, "x"),
        );
    }

    #[test]
    fn contains_respects_each_scope() {
        let names = Names::parse("myapp-staging-a").unwrap();

        assert!(SelectionGroup::for_service("myapp", "prod", None).contains("prod", "us-west-2", &names));
        assert!(!SelectionGroup::for_service("myapp", "test", None).contains("prod", "us-west-2", &names));
        assert!(!SelectionGroup::for_service("other", "prod", None).contains("prod", "us-west-2", &names));
        assert!(
            !SelectionGroup::for_service("myapp", "prod", Some("us-east-1"))
                .contains("prod", "us-west-2", &names)
        );
        assert!(SelectionGroup::for_stack("myapp", "prod", None, "staging").contains("prod", "us-east-1", &names));
        assert!(!SelectionGroup::for_stack("myapp", "prod", None, "prod").contains("prod", "us-east-1", &names));
        assert!(
            SelectionGroup::for_cluster("myapp", "prod", None, "myapp-staging-a")
                .contains("prod", "us-east-1", &names)
        );
        assert!(
            !SelectionGroup::for_cluster("myapp", "prod", None, "myapp-staging")
                .contains("prod", "us-east-1", &names)
        );
    }

    #[test]
    fn for_instance_follows_policy() {
        let ins = instance();
        let mut policy = Policy::default();

        policy.grouping = Grouping::Cluster;
        policy.regions_are_independent = true;
        assert_eq!(
            SelectionGroup::for_instance(&ins, &policy),
            SelectionGroup::for_cluster("myapp", "prod", Some("us-east-1"), "myapp-mystack-mydetail")
        );

        policy.grouping = Grouping::Stack;
        assert_eq!(
            SelectionGroup::for_instance(&ins, &policy),
            SelectionGroup::for_stack("myapp", "prod", Some("us-east-1"), "mystack")
        );

        policy.grouping = Grouping::Service;
        policy.regions_are_independent = false;
        assert_eq!(
            SelectionGroup::for_instance(&ins, &policy),
            SelectionGroup::for_service("myapp", "prod", None)
        );
    }

    #[test]
    fn json_omits_absent_fields() {
        let group = SelectionGroup::for_stack("myapp", "prod", None, "staging");
        let json = serde_json::to_string(&group).unwrap();
        assert_eq!(json, r#"{"service":"myapp","account":"prod","stack":"staging"}"#);

        let parsed: SelectionGroup = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, group);
    }

    #[test]
    fn json_rejects_stack_with_cluster() {
        let json = r#"{"service":"a","account":"prod","stack":"s","cluster":"a-s"}"#;
        assert!(serde_json::from_str::<SelectionGroup>(json).is_err());
    }

    #[test]
    fn table_key_marks_absent_fields() {
        let group = SelectionGroup::for_cluster("myapp", "prod", None, "myapp-prod");
        assert_eq!(group.table_key(), "myapp/prod/*/*/myapp-prod");
        assert_eq!(group.to_string(), "service=myapp account=prod cluster=myapp-prod");
    }
}
