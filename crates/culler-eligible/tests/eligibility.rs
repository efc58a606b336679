//! Eligibility scenarios against static topologies.

use culler_core::{DeployError, Exception, Instance, NeverEligible, SelectionGroup, StaticDeployment};
use culler_eligible::{EligibleError, eligible_instances};

/// foo in prod: foo-crit and foo-staging in two regions, the lorin
/// variants in us-east-1 only.
fn foo_deployment() -> StaticDeployment {
    StaticDeployment::default()
        .with_asg("foo", "prod", "foo-crit", "us-east-1", "foo-crit-v001", &["i-11111111", "i-22222222"])
        .with_asg("foo", "prod", "foo-crit", "us-west-2", "foo-crit-v001", &["i-aaaaaaaa", "i-bbbbbbbb"])
        .with_asg("foo", "prod", "foo-crit-lorin", "us-east-1", "foo-crit-lorin-v123", &["i-33333333", "i-44444444"])
        .with_asg("foo", "prod", "foo-staging", "us-east-1", "foo-staging-v005", &["i-55555555", "i-66666666"])
        .with_asg("foo", "prod", "foo-staging", "us-west-2", "foo-staging-v005", &["i-cccccccc", "i-dddddddd"])
        .with_asg("foo", "prod", "foo-staging-lorin", "us-east-1", "foo-staging-lorin-v117", &["i-77777777", "i-88888888"])
}

fn ids(instances: &[Instance]) -> Vec<&str> {
    let mut ids: Vec<&str> = instances.iter().map(|i| i.id.as_str()).collect();
    ids.sort();
    ids
}

fn group(region: Option<&str>, stack: Option<&str>, cluster: Option<&str>) -> SelectionGroup {
    SelectionGroup::new(
        "foo",
        "prod",
        region.map(str::to_string),
        stack.map(str::to_string),
        cluster.map(str::to_string),
    )
    .unwrap()
}

#[test]
fn groupings_select_expected_instances() {
    let dep = foo_deployment();
    let never = NeverEligible::default();
    let east = Some("us-east-1");

    let cases: Vec<(&str, SelectionGroup, Vec<&str>)> = vec![
        ("cluster", group(east, None, Some("foo-crit")), vec!["i-11111111", "i-22222222"]),
        (
            "stack",
            group(east, Some("staging"), None),
            vec!["i-55555555", "i-66666666", "i-77777777", "i-88888888"],
        ),
        (
            "service",
            group(east, None, None),
            vec![
                "i-11111111", "i-22222222", "i-33333333", "i-44444444",
                "i-55555555", "i-66666666", "i-77777777", "i-88888888",
            ],
        ),
        (
            "cluster, all regions",
            group(None, None, Some("foo-crit")),
            vec!["i-11111111", "i-22222222", "i-aaaaaaaa", "i-bbbbbbbb"],
        ),
        (
            "stack, all regions",
            group(None, Some("staging"), None),
            vec![
                "i-55555555", "i-66666666", "i-77777777", "i-88888888", "i-cccccccc", "i-dddddddd",
            ],
        ),
        (
            "service, all regions",
            group(None, None, None),
            vec![
                "i-11111111", "i-22222222", "i-33333333", "i-44444444", "i-55555555", "i-66666666",
                "i-77777777", "i-88888888", "i-aaaaaaaa", "i-bbbbbbbb", "i-cccccccc", "i-dddddddd",
            ],
        ),
    ];

    for (label, group, want) in cases {
        let got = eligible_instances(&group, &[], &never, &dep).unwrap();
        assert_eq!(ids(&got), want, "{label}");
    }
}

#[test]
fn exceptions_filter_clusters() {
    let dep = foo_deployment();
    let never = NeverEligible::default();
    let east = group(Some("us-east-1"), None, None);

    let cases: Vec<(&str, Vec<Exception>, Vec<&str>)> = vec![
        (
            "stack/detail/region",
            vec![Exception::new("prod", "crit", "lorin", "us-east-1")],
            vec!["i-11111111", "i-22222222", "i-55555555", "i-66666666", "i-77777777", "i-88888888"],
        ),
        (
            "stack/detail",
            vec![Exception::new("prod", "crit", "lorin", "*")],
            vec!["i-11111111", "i-22222222", "i-55555555", "i-66666666", "i-77777777", "i-88888888"],
        ),
        (
            "stack",
            vec![Exception::new("prod", "crit", "*", "*")],
            vec!["i-55555555", "i-66666666", "i-77777777", "i-88888888"],
        ),
        (
            "detail",
            vec![Exception::new("prod", "*", "lorin", "*")],
            vec!["i-11111111", "i-22222222", "i-55555555", "i-66666666"],
        ),
        (
            "all stacks",
            vec![
                Exception::new("prod", "crit", "*", "*"),
                Exception::new("prod", "staging", "*", "*"),
            ],
            vec![],
        ),
        (
            "blank detail",
            vec![Exception::new("prod", "*", "", "*")],
            vec!["i-33333333", "i-44444444", "i-77777777", "i-88888888"],
        ),
        (
            "stack, detail",
            vec![
                Exception::new("prod", "crit", "*", "*"),
                Exception::new("prod", "*", "lorin", "*"),
            ],
            vec!["i-55555555", "i-66666666"],
        ),
        (
            "whole account",
            vec![Exception::new("prod", "*", "*", "*")],
            vec![],
        ),
        (
            "other account",
            vec![Exception::new("test", "*", "*", "*")],
            vec![
                "i-11111111", "i-22222222", "i-33333333", "i-44444444",
                "i-55555555", "i-66666666", "i-77777777", "i-88888888",
            ],
        ),
    ];

    for (label, exceptions, want) in cases {
        let got = eligible_instances(&east, &exceptions, &never, &dep).unwrap();
        assert_eq!(ids(&got), want, "{label}");
    }
}

#[test]
fn multiple_exceptions_across_regions() {
    let mut dep = StaticDeployment::default();
    let layout = [
        ("abcloud", ["i-7921a2f8", "i-8a1bd7ac", "i-87a90e92"]),
        ("abcloud-batch", ["i-2c25ab60", "i-3bc40bdb", "i-2910a0e4"]),
        ("abcloud-ecom", ["i-ab9a4f10", "i-b28a69c8", "i-4fa09365"]),
    ];
    for (cluster, [east, west, eu]) in layout {
        let asg = format!("{cluster}-v123");
        dep = dep
            .with_asg("abcloud", "prod", cluster, "us-east-1", &asg, &[east])
            .with_asg("abcloud", "prod", cluster, "us-west-2", &asg, &[west])
            .with_asg("abcloud", "prod", cluster, "eu-west-1", &asg, &[eu]);
    }

    let exceptions = [
        Exception::new("prod", "batch", "", "eu-west-1"),
        Exception::new("prod", "ecom", "", "us-west-2"),
        Exception::new("prod", "", "", "us-west-2"),
    ];
    let group = SelectionGroup::for_service("abcloud", "prod", None);

    let got = eligible_instances(&group, &exceptions, &NeverEligible::default(), &dep).unwrap();
    let got = ids(&got);
    assert_eq!(got.len(), 6);
    for excepted in ["i-8a1bd7ac", "i-2910a0e4", "i-b28a69c8"] {
        assert!(!got.contains(&excepted), "{excepted} should be excepted");
    }
}

#[test]
fn never_eligible_clusters_are_skipped() {
    let mut dep = StaticDeployment::default();
    let layout = [
        ("mock-prod-a", "i-4a003cd0", "i-efdc42dc"),
        ("mock-prod-b", "i-115ccc27", "i-7881287e"),
        ("mock-prod-b-baseline", "i-e71a94d0", "i-69211000"),
        ("mock-prod-b-canary", "i-18d2e1b6", "i-63bda865"),
        ("mock-prod-a-citrus", "i-d26e6af1", "i-1db216c3"),
        ("mock-prod-a-citrusproxy", "i-c57ad10c", "i-6fba090b"),
    ];
    for (cluster, east, west) in layout {
        dep = dep
            .with_asg("mock", "prod", cluster, "us-east-1", &format!("{cluster}-v012"), &[east])
            .with_asg("mock", "prod", cluster, "us-west-2", &format!("{cluster}-v011"), &[west]);
    }

    let never = NeverEligible::default();
    let group = SelectionGroup::for_service("mock", "prod", None);
    let got = eligible_instances(&group, &[], &never, &dep).unwrap();
    assert_eq!(got.len(), 4);
    assert!(got.iter().all(|i| !never.matches(&i.cluster)));

    // Even an explicit cluster group cannot reach a canary.
    let canary = SelectionGroup::for_cluster("mock", "prod", None, "mock-prod-b-canary");
    assert!(eligible_instances(&canary, &[], &never, &dep).unwrap().is_empty());
}

#[test]
fn pinned_region_limits_clusters() {
    let dep = StaticDeployment::default()
        .with_asg("foo", "prod", "foo-useast1", "us-east-1", "foo-useast1-v001", &["i-1", "i-2", "i-3"])
        .with_asg("foo", "prod", "foo-uswest2", "us-west-2", "foo-uswest2-v005", &["i-c", "i-d"]);

    let group = SelectionGroup::for_service("foo", "prod", Some("us-east-1"));
    let got = eligible_instances(&group, &[], &NeverEligible::default(), &dep).unwrap();
    assert_eq!(ids(&got), vec!["i-1", "i-2", "i-3"]);

    let nowhere = SelectionGroup::for_service("foo", "prod", Some("eu-west-1"));
    assert!(eligible_instances(&nowhere, &[], &NeverEligible::default(), &dep).unwrap().is_empty());
}

#[test]
fn cluster_in_two_regions() {
    let dep = StaticDeployment::default()
        .with_asg("foo", "prod", "foo-prod", "us-east-1", "foo-prod-v001", &["i-1", "i-2", "i-3"])
        .with_asg("foo", "prod", "foo-prod", "us-west-2", "foo-prod-v001", &["i-a", "i-b", "i-c"]);

    let group = SelectionGroup::for_service("foo", "prod", None);
    let got = eligible_instances(&group, &[], &NeverEligible::default(), &dep).unwrap();
    assert_eq!(got.len(), 6);
}

#[test]
fn instances_carry_context() {
    let dep = foo_deployment();
    let group = SelectionGroup::for_cluster("foo", "prod", Some("us-east-1"), "foo-crit-lorin");
    let got = eligible_instances(&group, &[], &NeverEligible::default(), &dep).unwrap();

    assert_eq!(got.len(), 2);
    let first = &got[0];
    assert_eq!(first.service, "foo");
    assert_eq!(first.account, "prod");
    assert_eq!(first.region, "us-east-1");
    assert_eq!(first.stack, "crit");
    assert_eq!(first.detail, "lorin");
    assert_eq!(first.cluster, "foo-crit-lorin");
    assert_eq!(first.asg, "foo-crit-lorin-v123");
    assert_eq!(first.cloud_provider, "aws");
}

#[test]
fn lookup_failures_propagate_with_context() {
    let dep = foo_deployment();
    let group = SelectionGroup::for_service("foo", "staging", None);
    let err = eligible_instances(&group, &[], &NeverEligible::default(), &dep).unwrap_err();
    match err {
        EligibleError::Deploy { context, source } => {
            assert!(context.contains("staging"), "{context}");
            assert!(matches!(source, DeployError::NotFound(_)));
        }
        other => panic!("unexpected error: {other}"),
    }
}
