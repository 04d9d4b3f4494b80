//! Topology assembly
//!
//! One synchronous pass from (network descriptor, configuration) to a
//! declaration graph. No I/O, no randomness, no global counters: the same
//! inputs always produce structurally identical output.

use crate::declaration::{
    DatabaseEngine, DatabasePlacement, Exposure, ImageSelector, IngressRule, InstancePlacement,
    LoadBalancerTopology, Protocol, RuleSource, SecurityGroupDecl, SecurityGroupId, StorageBounds,
    TeardownPolicy, TopologyGraph,
};
use crate::error::{ConfigurationError, Result};
use crate::network::{NetworkDescriptor, SubnetTier};
use serde::{Deserialize, Serialize};

/// Graph-local identity of the web-tier security group.
pub const WEB_SECURITY_GROUP: &str = "web";

/// Graph-local identity of the database-tier security group.
pub const DATABASE_SECURITY_GROUP: &str = "database";

/// Configuration knobs for one deployment unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologyConfig {
    /// Port the load balancer listener accepts traffic on.
    pub listener_port: u16,

    /// Instance class for web-tier compute instances.
    pub instance_class: String,

    /// Machine image for web-tier compute instances.
    pub image: ImageSelector,

    pub database_engine: DatabaseEngine,

    /// Port the database security rule permits. Defaults to the engine's
    /// well-known port.
    pub database_port: u16,

    pub database_instance_class: String,
    pub storage: StorageBounds,
    pub multi_az: bool,
    pub teardown: TeardownPolicy,
    pub delete_automated_backups: bool,
}

impl Default for TopologyConfig {
    fn default() -> Self {
        let database_engine = DatabaseEngine::mysql("8.0.26");
        Self {
            listener_port: 80,
            instance_class: "t2.micro".to_string(),
            image: ImageSelector::LatestAmazonLinux,
            database_port: database_engine.default_port(),
            database_engine,
            database_instance_class: "t3.micro".to_string(),
            storage: StorageBounds::new(20, 100),
            multi_az: true,
            teardown: TeardownPolicy::Destroy,
            delete_automated_backups: true,
        }
    }
}

/// Assembles the declaration graph for one deployment unit.
#[derive(Debug, Clone, Default)]
pub struct TopologyBuilder {
    config: TopologyConfig,
}

impl TopologyBuilder {
    pub fn new(config: TopologyConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TopologyConfig {
        &self.config
    }

    /// Build the full declaration graph.
    ///
    /// Validation runs up front: on failure no declaration is emitted and
    /// the error names the violated precondition.
    pub fn build(&self, network: &NetworkDescriptor) -> Result<TopologyGraph> {
        self.validate(network)?;

        // Web group first. The database rule below references it by
        // identity, so it must already exist in the graph.
        let web_sg = SecurityGroupDecl {
            id: SecurityGroupId::new(WEB_SECURITY_GROUP),
            description: "Security group for web servers".to_string(),
            allow_all_outbound: true,
            ingress: vec![IngressRule {
                source: RuleSource::AnyIpv4,
                protocol: Protocol::Tcp,
                port: self.config.listener_port,
                description: "Allow HTTP traffic".to_string(),
            }],
        };

        // The database tier admits traffic from the web group only, never
        // from a raw address range.
        let database_sg = SecurityGroupDecl {
            id: SecurityGroupId::new(DATABASE_SECURITY_GROUP),
            description: "Security group for the database tier".to_string(),
            allow_all_outbound: true,
            ingress: vec![IngressRule {
                source: RuleSource::Group(web_sg.id.clone()),
                protocol: Protocol::Tcp,
                port: self.config.database_port,
                description: format!(
                    "Allow {} traffic from web servers",
                    self.config.database_engine.name
                ),
            }],
        };

        // One placement per public subnet, index derived purely from
        // enumeration position.
        let instances: Vec<InstancePlacement> = network
            .public
            .iter()
            .enumerate()
            .map(|(position, subnet)| InstancePlacement {
                index: position as u32 + 1,
                subnet: subnet.clone(),
                security_group: web_sg.id.clone(),
                instance_class: self.config.instance_class.clone(),
                image: self.config.image.clone(),
            })
            .collect();

        if instances.is_empty() {
            // Valid bootstrap state: the listener is declared with nothing
            // to dispatch to.
            tracing::warn!("no public subnets: load balancer will have an empty target list");
        } else {
            tracing::debug!(
                count = instances.len(),
                "placed web instances across public subnets"
            );
        }

        let database = DatabasePlacement {
            tier: SubnetTier::PrivateWithEgress,
            subnets: network.private_with_egress.clone(),
            security_group: database_sg.id.clone(),
            engine: self.config.database_engine.clone(),
            instance_class: self.config.database_instance_class.clone(),
            storage: self.config.storage,
            multi_az: self.config.multi_az,
            teardown: self.config.teardown,
            delete_automated_backups: self.config.delete_automated_backups,
        };

        let load_balancer = LoadBalancerTopology {
            security_group: web_sg.id.clone(),
            listener_port: self.config.listener_port,
            open: true,
            exposure: Exposure::InternetFacing,
            targets: instances.iter().map(|p| p.index).collect(),
        };

        let graph = TopologyGraph {
            security_groups: vec![web_sg, database_sg],
            instances,
            database,
            load_balancer,
        };

        // Re-check the ordering invariant instead of trusting construction
        // sequence alone.
        graph.verify_references()?;

        Ok(graph)
    }

    fn validate(&self, network: &NetworkDescriptor) -> Result<()> {
        if network.private_with_egress.is_empty() {
            return Err(ConfigurationError::EmptySubnetTier(
                SubnetTier::PrivateWithEgress,
            ));
        }
        if self.config.listener_port == 0 {
            return Err(ConfigurationError::InvalidPort(self.config.listener_port));
        }
        if self.config.database_port == 0 {
            return Err(ConfigurationError::InvalidPort(self.config.database_port));
        }
        self.config.storage.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::SubnetId;

    fn two_tier_network() -> NetworkDescriptor {
        NetworkDescriptor::new()
            .with_public("subnet-a")
            .with_public("subnet-b")
            .with_private_with_egress("subnet-c")
    }

    #[test]
    fn one_placement_per_public_subnet() {
        let graph = TopologyBuilder::default().build(&two_tier_network()).unwrap();

        assert_eq!(graph.instances.len(), 2);
        assert_eq!(graph.security_groups.len(), 2);
        assert_eq!(graph.database.subnets, vec![SubnetId::from("subnet-c")]);
    }

    #[test]
    fn placement_index_follows_descriptor_order() {
        let graph = TopologyBuilder::default().build(&two_tier_network()).unwrap();

        assert_eq!(graph.instances[0].index, 1);
        assert_eq!(graph.instances[0].subnet, SubnetId::from("subnet-a"));
        assert_eq!(graph.instances[1].index, 2);
        assert_eq!(graph.instances[1].subnet, SubnetId::from("subnet-b"));
    }

    #[test]
    fn database_rule_source_is_web_group_not_cidr() {
        let graph = TopologyBuilder::default().build(&two_tier_network()).unwrap();

        let db_sg = graph
            .security_group(&SecurityGroupId::new(DATABASE_SECURITY_GROUP))
            .unwrap();
        assert_eq!(db_sg.ingress.len(), 1);
        assert_eq!(
            db_sg.ingress[0].source,
            RuleSource::Group(SecurityGroupId::new(WEB_SECURITY_GROUP))
        );
        assert_eq!(db_sg.ingress[0].port, 3306);
    }

    #[test]
    fn web_rule_is_open_on_listener_port() {
        let graph = TopologyBuilder::default().build(&two_tier_network()).unwrap();

        let web_sg = graph
            .security_group(&SecurityGroupId::new(WEB_SECURITY_GROUP))
            .unwrap();
        assert_eq!(web_sg.ingress[0].source, RuleSource::AnyIpv4);
        assert_eq!(web_sg.ingress[0].port, 80);
    }

    #[test]
    fn builds_are_idempotent() {
        let builder = TopologyBuilder::default();
        let network = two_tier_network();

        let first = builder.build(&network).unwrap();
        let second = builder.build(&network).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn zero_public_subnets_is_degenerate_but_valid() {
        let network = NetworkDescriptor::new().with_private_with_egress("subnet-c");
        let graph = TopologyBuilder::default().build(&network).unwrap();

        assert!(graph.instances.is_empty());
        assert!(graph.load_balancer.targets.is_empty());
        assert_eq!(graph.security_groups.len(), 2);
    }

    #[test]
    fn zero_private_subnets_fails() {
        let network = NetworkDescriptor::new().with_public("subnet-a");
        let err = TopologyBuilder::default().build(&network).unwrap_err();

        assert_eq!(
            err,
            ConfigurationError::EmptySubnetTier(SubnetTier::PrivateWithEgress)
        );
    }

    #[test]
    fn inverted_storage_bounds_fail() {
        let config = TopologyConfig {
            storage: StorageBounds::new(200, 100),
            ..Default::default()
        };
        let err = TopologyBuilder::new(config).build(&two_tier_network()).unwrap_err();

        assert_eq!(
            err,
            ConfigurationError::InvalidStorageBounds {
                allocated_gib: 200,
                max_allocated_gib: 100,
            }
        );
    }

    #[test]
    fn zero_listener_port_fails() {
        let config = TopologyConfig {
            listener_port: 0,
            ..Default::default()
        };
        let err = TopologyBuilder::new(config).build(&two_tier_network()).unwrap_err();

        assert_eq!(err, ConfigurationError::InvalidPort(0));
    }

    #[test]
    fn teardown_is_explicitly_destructive_by_default() {
        let graph = TopologyBuilder::default().build(&two_tier_network()).unwrap();

        assert_eq!(graph.database.teardown, TeardownPolicy::Destroy);
        assert!(graph.database.delete_automated_backups);
        assert!(graph.database.multi_az);
    }
}
