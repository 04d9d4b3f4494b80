//! Ordered declare pass
//!
//! Walks a [`TopologyGraph`] in dependency order and emits the five
//! black-box engine calls: security groups first (web before database),
//! then instance placements, the database, the load balancer with its
//! listener, and finally target registration. Fail-fast: the first engine
//! error aborts the pass.

use crate::engine::{
    DatabaseRef, GroupRef, InstanceRef, ListenerRef, LoadBalancerRef, ProvisioningEngine,
    ResolvedRule, ResolvedSource,
};
use crate::error::{EngineError, Result};
use netform_topology::{RuleSource, SecurityGroupDecl, SecurityGroupId, TopologyGraph};
use serde::{Deserialize, Serialize};

/// Every engine ref minted while declaring a topology.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeclaredStack {
    /// Group refs in declaration order.
    pub security_groups: Vec<(SecurityGroupId, GroupRef)>,

    /// Instance refs in placement order.
    pub instances: Vec<InstanceRef>,

    pub database: DatabaseRef,
    pub load_balancer: LoadBalancerRef,
    pub listener: ListenerRef,
}

impl DeclaredStack {
    pub fn group_ref(&self, id: &SecurityGroupId) -> Option<&GroupRef> {
        self.security_groups
            .iter()
            .find(|(gid, _)| gid == id)
            .map(|(_, group_ref)| group_ref)
    }
}

/// Declare the whole graph through the given engine.
pub async fn declare_topology<E>(engine: &mut E, graph: &TopologyGraph) -> Result<DeclaredStack>
where
    E: ProvisioningEngine + ?Sized,
{
    let mut groups: Vec<(SecurityGroupId, GroupRef)> = Vec::new();

    for decl in &graph.security_groups {
        let rules = resolve_rules(decl, &groups)?;
        tracing::info!(engine = engine.name(), group = %decl.id, "declaring security group");
        let group_ref = engine.declare_security_group(decl, rules).await?;
        groups.push((decl.id.clone(), group_ref));
    }

    let mut instances = Vec::with_capacity(graph.instances.len());
    for placement in &graph.instances {
        let group = lookup_group(&groups, &placement.security_group)?;
        tracing::info!(
            engine = engine.name(),
            instance = %placement.name(),
            subnet = %placement.subnet,
            "declaring instance"
        );
        instances.push(engine.declare_instance(placement, group).await?);
    }

    let db_group = lookup_group(&groups, &graph.database.security_group)?;
    tracing::info!(engine = engine.name(), "declaring database");
    let database = engine.declare_database(&graph.database, db_group).await?;

    let lb_group = lookup_group(&groups, &graph.load_balancer.security_group)?;
    tracing::info!(
        engine = engine.name(),
        port = graph.load_balancer.listener_port,
        "declaring load balancer"
    );
    let (load_balancer, listener) = engine
        .declare_load_balancer_and_listener(&graph.load_balancer, lb_group)
        .await?;

    // Targets in placement order, resolved through the graph's target list
    // rather than assumed from instance iteration.
    let mut targets = Vec::with_capacity(graph.load_balancer.targets.len());
    for index in &graph.load_balancer.targets {
        let position = graph
            .instances
            .iter()
            .position(|p| p.index == *index)
            .ok_or_else(|| EngineError::UnresolvedReference(format!("web-{index}")))?;
        targets.push(instances[position].clone());
    }
    engine.register_targets(&listener, &targets).await?;

    Ok(DeclaredStack {
        security_groups: groups,
        instances,
        database,
        load_balancer,
        listener,
    })
}

/// Resolve peer-group rule sources against already-minted refs. A source
/// referencing a group that has not been declared yet is the ordering
/// violation the topology core promises never to produce.
fn resolve_rules(
    decl: &SecurityGroupDecl,
    groups: &[(SecurityGroupId, GroupRef)],
) -> Result<Vec<ResolvedRule>> {
    decl.ingress
        .iter()
        .map(|rule| {
            let source = match &rule.source {
                RuleSource::AnyIpv4 => ResolvedSource::AnyIpv4,
                RuleSource::Cidr(cidr) => ResolvedSource::Cidr(cidr.clone()),
                RuleSource::Group(peer) => {
                    ResolvedSource::Group(lookup_group(groups, peer)?.clone())
                }
            };
            Ok(ResolvedRule {
                source,
                protocol: rule.protocol,
                port: rule.port,
                description: rule.description.clone(),
            })
        })
        .collect()
}

fn lookup_group<'a>(
    groups: &'a [(SecurityGroupId, GroupRef)],
    id: &SecurityGroupId,
) -> Result<&'a GroupRef> {
    groups
        .iter()
        .find(|(gid, _)| gid == id)
        .map(|(_, group_ref)| group_ref)
        .ok_or_else(|| EngineError::UnresolvedReference(id.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::PlanningEngine;
    use async_trait::async_trait;
    use netform_topology::{
        DatabasePlacement, InstancePlacement, LoadBalancerTopology, NetworkDescriptor,
        TopologyBuilder,
    };

    /// Engine that fails on the database declaration and counts the calls
    /// that reached it.
    #[derive(Default)]
    struct FailingEngine {
        registered_targets: bool,
    }

    #[async_trait]
    impl ProvisioningEngine for FailingEngine {
        fn name(&self) -> &str {
            "failing"
        }

        async fn declare_security_group(
            &mut self,
            decl: &SecurityGroupDecl,
            _rules: Vec<ResolvedRule>,
        ) -> Result<GroupRef> {
            Ok(GroupRef::new(format!("sg-{}", decl.id)))
        }

        async fn declare_instance(
            &mut self,
            placement: &InstancePlacement,
            _group: &GroupRef,
        ) -> Result<InstanceRef> {
            Ok(InstanceRef::new(placement.name()))
        }

        async fn declare_database(
            &mut self,
            _placement: &DatabasePlacement,
            _group: &GroupRef,
        ) -> Result<DatabaseRef> {
            Err(EngineError::DeclareFailed {
                resource: "database".to_string(),
                message: "quota exceeded".to_string(),
            })
        }

        async fn declare_load_balancer_and_listener(
            &mut self,
            _topology: &LoadBalancerTopology,
            _group: &GroupRef,
        ) -> Result<(LoadBalancerRef, ListenerRef)> {
            Ok((LoadBalancerRef::new("lb"), ListenerRef::new("listener")))
        }

        async fn register_targets(
            &mut self,
            _listener: &ListenerRef,
            _targets: &[InstanceRef],
        ) -> Result<()> {
            self.registered_targets = true;
            Ok(())
        }
    }

    fn sample_graph() -> TopologyGraph {
        let network = NetworkDescriptor::new()
            .with_public("subnet-a")
            .with_public("subnet-b")
            .with_private_with_egress("subnet-c");
        TopologyBuilder::default().build(&network).unwrap()
    }

    #[tokio::test]
    async fn declared_stack_holds_every_ref() {
        let mut engine = PlanningEngine::new();
        let stack = declare_topology(&mut engine, &sample_graph()).await.unwrap();

        assert_eq!(stack.security_groups.len(), 2);
        assert_eq!(stack.instances.len(), 2);
        assert!(stack
            .group_ref(&SecurityGroupId::new("web"))
            .is_some());
        assert!(stack.group_ref(&SecurityGroupId::new("missing")).is_none());
    }

    #[tokio::test]
    async fn engine_failure_aborts_the_pass() {
        let mut engine = FailingEngine::default();
        let err = declare_topology(&mut engine, &sample_graph())
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::DeclareFailed { .. }));
        assert!(!engine.registered_targets);
    }
}
