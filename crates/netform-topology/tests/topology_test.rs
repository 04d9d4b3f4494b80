use netform_topology::{
    ConfigurationError, NetworkDescriptor, Protocol, RuleSource, SecurityGroupId, SubnetId,
    TopologyBuilder, DATABASE_SECURITY_GROUP, WEB_SECURITY_GROUP,
};

#[test]
fn two_public_one_private_end_to_end() {
    let network = NetworkDescriptor::new()
        .with_public("subnet-a")
        .with_public("subnet-b")
        .with_private_with_egress("subnet-c");

    let graph = TopologyBuilder::default().build(&network).unwrap();

    // Web group: tcp/80 from anywhere.
    let web = graph
        .security_group(&SecurityGroupId::new(WEB_SECURITY_GROUP))
        .unwrap();
    assert_eq!(web.ingress.len(), 1);
    assert_eq!(web.ingress[0].source, RuleSource::AnyIpv4);
    assert_eq!(web.ingress[0].protocol, Protocol::Tcp);
    assert_eq!(web.ingress[0].port, 80);

    // Database group: tcp/3306 from the web group only.
    let db = graph
        .security_group(&SecurityGroupId::new(DATABASE_SECURITY_GROUP))
        .unwrap();
    assert_eq!(db.ingress.len(), 1);
    assert_eq!(
        db.ingress[0].source,
        RuleSource::Group(web.id.clone())
    );
    assert_eq!(db.ingress[0].port, 3306);

    // Placements (1, subnet-a) and (2, subnet-b), both in the web group.
    assert_eq!(graph.instances.len(), 2);
    for (placement, (index, subnet)) in graph
        .instances
        .iter()
        .zip([(1, "subnet-a"), (2, "subnet-b")])
    {
        assert_eq!(placement.index, index);
        assert_eq!(placement.subnet, SubnetId::from(subnet));
        assert_eq!(placement.security_group, web.id);
    }

    // One database on subnet-c, isolated behind the database group.
    assert_eq!(graph.database.subnets, vec![SubnetId::from("subnet-c")]);
    assert_eq!(graph.database.security_group, db.id);

    // Listener on 80 targeting [web-1, web-2], in placement order.
    assert_eq!(graph.load_balancer.listener_port, 80);
    assert_eq!(graph.load_balancer.targets, vec![1, 2]);

    graph.verify_references().unwrap();
}

#[test]
fn failed_build_reports_which_precondition_was_violated() {
    let network = NetworkDescriptor::new().with_public("subnet-a");
    let err = TopologyBuilder::default().build(&network).unwrap_err();

    assert!(matches!(err, ConfigurationError::EmptySubnetTier(_)));
    assert!(err.to_string().contains("private-with-egress"));
}

#[test]
fn graph_serializes_to_a_stack_artifact() {
    let network = NetworkDescriptor::new()
        .with_public("subnet-a")
        .with_private_with_egress("subnet-c");

    let graph = TopologyBuilder::default().build(&network).unwrap();
    let artifact = graph.to_artifact_json().unwrap();

    let value: serde_json::Value = serde_json::from_str(&artifact).unwrap();
    assert_eq!(value["security_groups"][0]["id"], "web");
    assert_eq!(value["security_groups"][1]["id"], "database");
    assert_eq!(value["database"]["engine"]["name"], "mysql");
    assert_eq!(value["database"]["engine"]["version"], "8.0.26");
    assert_eq!(value["load_balancer"]["exposure"], "internet_facing");
}
