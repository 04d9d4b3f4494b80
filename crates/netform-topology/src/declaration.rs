//! Declaration records
//!
//! Every type here is a desired-state descriptor, not a live resource.
//! Records are constructed once by the builder, never mutated afterwards,
//! and handed to the provisioning engine whole. Teardown is delegated to
//! the engine via the declared [`TeardownPolicy`].

use crate::error::{ConfigurationError, Result};
use crate::network::{SubnetId, SubnetTier};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Graph-local identity of a security group declaration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SecurityGroupId(String);

impl SecurityGroupId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SecurityGroupId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Transport protocol for a security rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Protocol {
    Tcp,
    Udp,
}

/// Source of an ingress rule.
///
/// A `Group` source creates a dependency edge: the referenced group must
/// already exist in the declaration graph when the rule is attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleSource {
    /// Any IPv4 source (0.0.0.0/0).
    AnyIpv4,
    /// A literal CIDR block.
    Cidr(String),
    /// A peer security group, referenced by graph-local identity.
    Group(SecurityGroupId),
}

/// A single ingress rule attached to a security group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngressRule {
    pub source: RuleSource,
    pub protocol: Protocol,
    pub port: u16,
    pub description: String,
}

/// Desired state of one security group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityGroupDecl {
    pub id: SecurityGroupId,
    pub description: String,
    pub allow_all_outbound: bool,
    pub ingress: Vec<IngressRule>,
}

/// How the machine image for a compute instance is selected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageSelector {
    /// Latest Amazon Linux image available at apply time.
    LatestAmazonLinux,
    /// A named image, resolved by the provisioning engine.
    Named(String),
}

/// Placement of one web-tier compute instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstancePlacement {
    /// 1-based position in the public-subnet enumeration. Declaration
    /// identity only, no semantic meaning.
    pub index: u32,

    pub subnet: SubnetId,
    pub security_group: SecurityGroupId,
    pub instance_class: String,
    pub image: ImageSelector,
}

impl InstancePlacement {
    /// Logical name of the placement (`web-1`, `web-2`, ...).
    pub fn name(&self) -> String {
        format!("web-{}", self.index)
    }
}

/// Managed database engine selection with a pinned version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseEngine {
    pub name: String,
    pub version: String,
}

impl DatabaseEngine {
    pub fn mysql(version: impl Into<String>) -> Self {
        Self {
            name: "mysql".to_string(),
            version: version.into(),
        }
    }

    pub fn postgres(version: impl Into<String>) -> Self {
        Self {
            name: "postgres".to_string(),
            version: version.into(),
        }
    }

    /// Well-known port for the engine. Configuration may override it.
    pub fn default_port(&self) -> u16 {
        match self.name.as_str() {
            "postgres" => 5432,
            _ => 3306,
        }
    }
}

/// Storage bounds for the managed database, in GiB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageBounds {
    pub allocated_gib: u32,
    pub max_allocated_gib: u32,
}

impl StorageBounds {
    pub fn new(allocated_gib: u32, max_allocated_gib: u32) -> Self {
        Self {
            allocated_gib,
            max_allocated_gib,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.allocated_gib > self.max_allocated_gib {
            return Err(ConfigurationError::InvalidStorageBounds {
                allocated_gib: self.allocated_gib,
                max_allocated_gib: self.max_allocated_gib,
            });
        }
        Ok(())
    }
}

/// What happens to the database when the stack is removed.
///
/// `Destroy` drops data and automated backups past removal. That is a
/// deliberate, documented tradeoff for disposable environments; retention
/// must be opted into explicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TeardownPolicy {
    Destroy,
    Retain,
}

/// Placement of the managed database in the private tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabasePlacement {
    pub tier: SubnetTier,
    /// Subnets of the tier, anchoring the database subnet group.
    pub subnets: Vec<SubnetId>,
    pub security_group: SecurityGroupId,
    pub engine: DatabaseEngine,
    pub instance_class: String,
    pub storage: StorageBounds,
    pub multi_az: bool,
    pub teardown: TeardownPolicy,
    pub delete_automated_backups: bool,
}

/// Load balancer exposure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Exposure {
    InternetFacing,
    Internal,
}

/// Load balancer, listener, and target wiring for the web tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadBalancerTopology {
    pub security_group: SecurityGroupId,
    pub listener_port: u16,
    /// Whether the listener accepts traffic from any source.
    pub open: bool,
    pub exposure: Exposure,
    /// Placement indices of the instance targets, in placement order. May
    /// be empty when the network has no public subnets.
    pub targets: Vec<u32>,
}

/// Completed declaration graph: the unit of output handed to the
/// provisioning engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologyGraph {
    /// Security groups in dependency order: a group always precedes any
    /// rule that references it.
    pub security_groups: Vec<SecurityGroupDecl>,

    /// Web-tier placements, one per public subnet, in descriptor order.
    pub instances: Vec<InstancePlacement>,

    pub database: DatabasePlacement,
    pub load_balancer: LoadBalancerTopology,
}

impl TopologyGraph {
    pub fn security_group(&self, id: &SecurityGroupId) -> Option<&SecurityGroupDecl> {
        self.security_groups.iter().find(|g| &g.id == id)
    }

    /// Check that every by-reference edge targets an entity declared
    /// earlier in the graph. The builder calls this before returning, so a
    /// graph it produced never fails here; a hand-assembled graph might.
    pub fn verify_references(&self) -> Result<()> {
        let mut declared: HashSet<&SecurityGroupId> = HashSet::new();
        for group in &self.security_groups {
            for rule in &group.ingress {
                if let RuleSource::Group(peer) = &rule.source {
                    if !declared.contains(peer) {
                        return Err(ConfigurationError::DanglingReference(peer.to_string()));
                    }
                }
            }
            declared.insert(&group.id);
        }

        for placement in &self.instances {
            if !declared.contains(&placement.security_group) {
                return Err(ConfigurationError::DanglingReference(
                    placement.security_group.to_string(),
                ));
            }
        }
        if !declared.contains(&self.database.security_group) {
            return Err(ConfigurationError::DanglingReference(
                self.database.security_group.to_string(),
            ));
        }
        if !declared.contains(&self.load_balancer.security_group) {
            return Err(ConfigurationError::DanglingReference(
                self.load_balancer.security_group.to_string(),
            ));
        }

        let indices: HashSet<u32> = self.instances.iter().map(|p| p.index).collect();
        for target in &self.load_balancer.targets {
            if !indices.contains(target) {
                return Err(ConfigurationError::DanglingReference(format!("web-{target}")));
            }
        }

        Ok(())
    }

    /// Render the graph as a JSON stack artifact.
    pub fn to_artifact_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
