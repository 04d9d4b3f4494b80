//! Provisioning-engine capability surface
//!
//! The engine owns everything the topology core treats as a black box:
//! credentials, API calls, resource diffing, retries. It is injected into
//! the declare pass rather than resolved globally, so a dry-run engine and
//! a real one are interchangeable.

use crate::error::Result;
use async_trait::async_trait;
use netform_topology::{
    DatabasePlacement, InstancePlacement, LoadBalancerTopology, Protocol, SecurityGroupDecl,
};
use serde::{Deserialize, Serialize};

macro_rules! engine_ref {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

engine_ref!(
    /// Opaque ref minted by the engine for a declared security group.
    GroupRef
);
engine_ref!(
    /// Opaque ref minted by the engine for a declared compute instance.
    InstanceRef
);
engine_ref!(
    /// Opaque ref minted by the engine for a declared database.
    DatabaseRef
);
engine_ref!(
    /// Opaque ref minted by the engine for a declared load balancer.
    LoadBalancerRef
);
engine_ref!(
    /// Opaque ref minted by the engine for a declared listener.
    ListenerRef
);

/// Rule source with any peer-group reference resolved to an engine ref.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolvedSource {
    AnyIpv4,
    Cidr(String),
    Group(GroupRef),
}

/// An ingress rule ready for the engine: by the time a rule reaches an
/// engine, every group it references has already been declared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedRule {
    pub source: ResolvedSource,
    pub protocol: Protocol,
    pub port: u16,
    pub description: String,
}

/// Black-box provisioning capabilities consumed by the declare pass.
///
/// Implementations map declarations onto a real provider (or record them,
/// see [`crate::plan::PlanningEngine`]). Retries and drift detection belong
/// here, not in the topology core.
#[async_trait]
pub trait ProvisioningEngine: Send + Sync {
    /// Engine name for logs (e.g. "plan", "aws").
    fn name(&self) -> &str;

    async fn declare_security_group(
        &mut self,
        decl: &SecurityGroupDecl,
        rules: Vec<ResolvedRule>,
    ) -> Result<GroupRef>;

    async fn declare_instance(
        &mut self,
        placement: &InstancePlacement,
        group: &GroupRef,
    ) -> Result<InstanceRef>;

    async fn declare_database(
        &mut self,
        placement: &DatabasePlacement,
        group: &GroupRef,
    ) -> Result<DatabaseRef>;

    async fn declare_load_balancer_and_listener(
        &mut self,
        topology: &LoadBalancerTopology,
        group: &GroupRef,
    ) -> Result<(LoadBalancerRef, ListenerRef)>;

    async fn register_targets(
        &mut self,
        listener: &ListenerRef,
        targets: &[InstanceRef],
    ) -> Result<()>;
}
