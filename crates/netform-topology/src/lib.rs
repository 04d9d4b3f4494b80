//! netform topology core
//!
//! Declares a web/database network topology for a provisioning engine to
//! reconcile: web-tier compute instances fronted by a load balancer, a
//! managed relational database isolated in a private subnet tier, and the
//! security-group rules gating traffic between the tiers.
//!
//! The crate is a pure function from (network descriptor, configuration) to
//! a declaration graph. It performs no I/O and talks to no provider; the
//! graph is handed whole to a provisioning engine (see `netform-engine`).
//!
//! ```
//! use netform_topology::{NetworkDescriptor, TopologyBuilder};
//!
//! let network = NetworkDescriptor::new()
//!     .with_public("subnet-a")
//!     .with_public("subnet-b")
//!     .with_private_with_egress("subnet-c");
//!
//! let graph = TopologyBuilder::default().build(&network)?;
//! assert_eq!(graph.instances.len(), 2);
//! # Ok::<(), netform_topology::ConfigurationError>(())
//! ```

pub mod builder;
pub mod declaration;
pub mod error;
pub mod network;

// Re-exports
pub use builder::{DATABASE_SECURITY_GROUP, TopologyBuilder, TopologyConfig, WEB_SECURITY_GROUP};
pub use declaration::{
    DatabaseEngine, DatabasePlacement, Exposure, ImageSelector, IngressRule, InstancePlacement,
    LoadBalancerTopology, Protocol, RuleSource, SecurityGroupDecl, SecurityGroupId, StorageBounds,
    TeardownPolicy, TopologyGraph,
};
pub use error::{ConfigurationError, Result};
pub use network::{NetworkDescriptor, SubnetId, SubnetTier};
