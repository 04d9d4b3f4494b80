//! Network descriptor types
//!
//! The builder consumes an already-discovered virtual network: subnets
//! partitioned by tier, each with an opaque identity usable as a placement
//! anchor. Iteration order within a tier is the placement order.

use serde::{Deserialize, Serialize};

/// Opaque subnet identity, used as a placement anchor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubnetId(String);

impl SubnetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SubnetId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for SubnetId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for SubnetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Subnet tier within the network. A subnet belongs to exactly one tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SubnetTier {
    /// Routable from the internet; hosts the web tier.
    Public,
    /// No inbound route, outbound egress only; hosts the database tier.
    PrivateWithEgress,
}

impl std::fmt::Display for SubnetTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubnetTier::Public => write!(f, "public"),
            SubnetTier::PrivateWithEgress => write!(f, "private-with-egress"),
        }
    }
}

/// Subnets of an existing virtual network, partitioned by tier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkDescriptor {
    /// Public subnets, in stable iteration order.
    pub public: Vec<SubnetId>,

    /// Private-with-egress subnets, in stable iteration order.
    pub private_with_egress: Vec<SubnetId>,
}

impl NetworkDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_public(mut self, id: impl Into<SubnetId>) -> Self {
        self.public.push(id.into());
        self
    }

    pub fn with_private_with_egress(mut self, id: impl Into<SubnetId>) -> Self {
        self.private_with_egress.push(id.into());
        self
    }

    /// Subnets of the given tier, in declaration order.
    pub fn subnets(&self, tier: SubnetTier) -> &[SubnetId] {
        match tier {
            SubnetTier::Public => &self.public,
            SubnetTier::PrivateWithEgress => &self.private_with_egress,
        }
    }
}
