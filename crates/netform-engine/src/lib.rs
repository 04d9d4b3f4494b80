//! netform provisioning-engine surface
//!
//! The topology core (`netform-topology`) produces a declaration graph;
//! this crate owns how that graph reaches a provisioning engine:
//!
//! - [`ProvisioningEngine`]: the black-box capability surface a provider
//!   backend implements (declare security group / instance / database /
//!   load balancer, register targets).
//! - [`declare_topology`]: the ordered declare pass. Groups go first (web
//!   before the database group that references it), then placements, the
//!   database, the load balancer, and target registration.
//! - [`PlanningEngine`]: an in-memory engine that records the calls as a
//!   [`Plan`] for dry runs and tests.
//!
//! ```
//! use netform_engine::{declare_topology, PlanningEngine};
//! use netform_topology::{NetworkDescriptor, TopologyBuilder};
//!
//! # tokio_test::block_on(async {
//! let network = NetworkDescriptor::new()
//!     .with_public("subnet-a")
//!     .with_private_with_egress("subnet-c");
//! let graph = TopologyBuilder::default().build(&network)?;
//!
//! let mut engine = PlanningEngine::new();
//! let stack = declare_topology(&mut engine, &graph).await?;
//! assert_eq!(stack.instances.len(), 1);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! # }).unwrap();
//! ```

pub mod apply;
pub mod engine;
pub mod error;
pub mod plan;

// Re-exports
pub use apply::{declare_topology, DeclaredStack};
pub use engine::{
    DatabaseRef, GroupRef, InstanceRef, ListenerRef, LoadBalancerRef, ProvisioningEngine,
    ResolvedRule, ResolvedSource,
};
pub use error::{EngineError, Result};
pub use plan::{plan_topology, DeclareCall, Plan, PlanSummary, PlanningEngine};
