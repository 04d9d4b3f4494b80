//! Dry-run engine
//!
//! [`PlanningEngine`] implements the capability surface in memory: it mints
//! deterministic refs and records every declare call, in order, as a
//! [`Plan`]. Used for previewing what an apply would do and as the test
//! double for the declare pass.

use crate::apply::declare_topology;
use crate::engine::{
    DatabaseRef, GroupRef, InstanceRef, ListenerRef, LoadBalancerRef, ProvisioningEngine,
    ResolvedRule,
};
use crate::error::Result;
use async_trait::async_trait;
use netform_topology::{
    DatabasePlacement, Exposure, InstancePlacement, LoadBalancerTopology, SecurityGroupDecl,
    SecurityGroupId, SubnetId, TopologyGraph,
};
use serde::{Deserialize, Serialize};

/// One recorded declare call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum DeclareCall {
    SecurityGroup {
        group: SecurityGroupId,
        rules: Vec<ResolvedRule>,
        group_ref: GroupRef,
    },
    Instance {
        name: String,
        subnet: SubnetId,
        group: GroupRef,
        instance_ref: InstanceRef,
    },
    Database {
        engine: String,
        multi_az: bool,
        group: GroupRef,
        database_ref: DatabaseRef,
    },
    LoadBalancer {
        exposure: Exposure,
        listener_port: u16,
        group: GroupRef,
        load_balancer_ref: LoadBalancerRef,
        listener_ref: ListenerRef,
    },
    RegisterTargets {
        listener: ListenerRef,
        targets: Vec<InstanceRef>,
    },
}

impl DeclareCall {
    pub fn kind(&self) -> &'static str {
        match self {
            DeclareCall::SecurityGroup { .. } => "security-group",
            DeclareCall::Instance { .. } => "instance",
            DeclareCall::Database { .. } => "database",
            DeclareCall::LoadBalancer { .. } => "load-balancer",
            DeclareCall::RegisterTargets { .. } => "register-targets",
        }
    }
}

/// Ordered list of declare calls produced by a dry run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub calls: Vec<DeclareCall>,
}

impl Plan {
    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    pub fn summary(&self) -> PlanSummary {
        let count = |kind: &str| self.calls.iter().filter(|c| c.kind() == kind).count();
        PlanSummary {
            security_groups: count("security-group"),
            instances: count("instance"),
            databases: count("database"),
            load_balancers: count("load-balancer"),
        }
    }
}

/// Summary of a plan's declare calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanSummary {
    pub security_groups: usize,
    pub instances: usize,
    pub databases: usize,
    pub load_balancers: usize,
}

impl std::fmt::Display for PlanSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} security groups, {} instances, {} databases, {} load balancers to declare",
            self.security_groups, self.instances, self.databases, self.load_balancers
        )
    }
}

/// In-memory engine that records declare calls instead of provisioning.
#[derive(Debug, Default)]
pub struct PlanningEngine {
    calls: Vec<DeclareCall>,
    next_id: u32,
}

impl PlanningEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> &[DeclareCall] {
        &self.calls
    }

    pub fn into_plan(self) -> Plan {
        Plan { calls: self.calls }
    }

    fn mint(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}-{:04}", prefix, self.next_id)
    }
}

#[async_trait]
impl ProvisioningEngine for PlanningEngine {
    fn name(&self) -> &str {
        "plan"
    }

    async fn declare_security_group(
        &mut self,
        decl: &SecurityGroupDecl,
        rules: Vec<ResolvedRule>,
    ) -> Result<GroupRef> {
        let group_ref = GroupRef::new(self.mint("sg"));
        self.calls.push(DeclareCall::SecurityGroup {
            group: decl.id.clone(),
            rules,
            group_ref: group_ref.clone(),
        });
        Ok(group_ref)
    }

    async fn declare_instance(
        &mut self,
        placement: &InstancePlacement,
        group: &GroupRef,
    ) -> Result<InstanceRef> {
        let instance_ref = InstanceRef::new(self.mint("i"));
        self.calls.push(DeclareCall::Instance {
            name: placement.name(),
            subnet: placement.subnet.clone(),
            group: group.clone(),
            instance_ref: instance_ref.clone(),
        });
        Ok(instance_ref)
    }

    async fn declare_database(
        &mut self,
        placement: &DatabasePlacement,
        group: &GroupRef,
    ) -> Result<DatabaseRef> {
        let database_ref = DatabaseRef::new(self.mint("db"));
        self.calls.push(DeclareCall::Database {
            engine: format!("{}/{}", placement.engine.name, placement.engine.version),
            multi_az: placement.multi_az,
            group: group.clone(),
            database_ref: database_ref.clone(),
        });
        Ok(database_ref)
    }

    async fn declare_load_balancer_and_listener(
        &mut self,
        topology: &LoadBalancerTopology,
        group: &GroupRef,
    ) -> Result<(LoadBalancerRef, ListenerRef)> {
        let load_balancer_ref = LoadBalancerRef::new(self.mint("lb"));
        let listener_ref = ListenerRef::new(self.mint("listener"));
        self.calls.push(DeclareCall::LoadBalancer {
            exposure: topology.exposure,
            listener_port: topology.listener_port,
            group: group.clone(),
            load_balancer_ref: load_balancer_ref.clone(),
            listener_ref: listener_ref.clone(),
        });
        Ok((load_balancer_ref, listener_ref))
    }

    async fn register_targets(
        &mut self,
        listener: &ListenerRef,
        targets: &[InstanceRef],
    ) -> Result<()> {
        self.calls.push(DeclareCall::RegisterTargets {
            listener: listener.clone(),
            targets: targets.to_vec(),
        });
        Ok(())
    }
}

/// Dry-run a graph: the ordered declare calls it would produce.
pub async fn plan_topology(graph: &TopologyGraph) -> Result<Plan> {
    let mut engine = PlanningEngine::new();
    declare_topology(&mut engine, graph).await?;
    Ok(engine.into_plan())
}
