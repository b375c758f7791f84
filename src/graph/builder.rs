//! Dependency graph construction.
//!
//! Each dependency-list entry of every descriptor is resolved to zero, one or
//! many providers. The result is an adjacency list indexed by
//! [`DescriptorId`]; it is built once and only read afterwards.
//!
//! A decorator's inner slot is never an edge. A consumer of a decorated
//! capability instead gets an edge to every decorator of that capability,
//! so cycles and lifetimes are checked through the chain.

use crate::core::{
    ComponentDescriptor, ComponentShape, DependencyKind, DependencyRef, DescriptorId,
    DescriptorSet,
};
use crate::diagnostics::{Diagnostic, DiagnosticCode, Diagnostics, Location};
use crate::extraction::factory_capability_name;
use serde::Serialize;
use std::collections::BTreeMap;

/// A consumer → provider edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Edge {
    pub consumer: DescriptorId,
    pub provider: DescriptorId,
    /// Index into the consumer's dependency list.
    pub dependency: usize,
    /// Resolved through lazy/provider indirection or a generated factory.
    pub deferred: bool,
}

/// Providers chosen for one dependency-list entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Resolution {
    pub dependency: usize,
    pub providers: Vec<DescriptorId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DependencyGraph {
    adjacency: Vec<Vec<Edge>>,
    resolutions: Vec<Vec<Resolution>>,
}

impl DependencyGraph {
    /// Resolve every dependency of every descriptor in `set`.
    pub fn build(set: &DescriptorSet, diagnostics: &mut Diagnostics) -> Self {
        let mut graph = Self {
            adjacency: vec![Vec::new(); set.len()],
            resolutions: vec![Vec::new(); set.len()],
        };

        let decorators = decorators_by_capability(set);

        for (consumer_id, consumer) in set.iter() {
            let inner_slots = decorator_inner_positions(consumer);
            let all_deferred = consumer.shape.is_excluded_factory();

            for (index, dependency) in consumer.dependencies.iter().enumerate() {
                if inner_slots.contains(&dependency.position) {
                    continue;
                }
                let providers = resolve(set, consumer_id, dependency);
                report_resolution(set, consumer, dependency, &providers, diagnostics);

                let deferred = all_deferred || dependency.kind == DependencyKind::Deferred;
                for provider in &providers {
                    graph.adjacency[consumer_id.index()].push(Edge {
                        consumer: consumer_id,
                        provider: *provider,
                        dependency: index,
                        deferred,
                    });
                }
                // Resolving a decorated capability constructs its whole chain.
                if !providers.is_empty() {
                    let chain = decorators
                        .get(&dependency.capability.to_string())
                        .into_iter()
                        .flatten()
                        .filter(|d| **d != consumer_id);
                    for decorator in chain {
                        graph.adjacency[consumer_id.index()].push(Edge {
                            consumer: consumer_id,
                            provider: *decorator,
                            dependency: index,
                            deferred,
                        });
                    }
                }
                graph.resolutions[consumer_id.index()].push(Resolution {
                    dependency: index,
                    providers,
                });
            }
        }

        tracing::debug!(
            nodes = set.len(),
            edges = graph.edge_count(),
            "dependency graph built"
        );
        graph
    }

    /// Outgoing edges of `id` in declared dependency order.
    pub fn edges_from(&self, id: DescriptorId) -> &[Edge] {
        self.adjacency
            .get(id.index())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Edges that are constructed directly rather than deferred.
    pub fn direct_edges_from(&self, id: DescriptorId) -> impl Iterator<Item = &Edge> {
        self.edges_from(id).iter().filter(|e| !e.deferred)
    }

    pub fn resolutions(&self, id: DescriptorId) -> &[Resolution] {
        self.resolutions
            .get(id.index())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Providers selected for one dependency entry of `consumer`.
    pub fn providers_for(&self, consumer: DescriptorId, dependency: usize) -> &[DescriptorId] {
        self.resolutions(consumer)
            .iter()
            .find(|r| r.dependency == dependency)
            .map(|r| r.providers.as_slice())
            .unwrap_or(&[])
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.adjacency.iter().flatten()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.iter().map(Vec::len).sum()
    }

    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    /// Descriptors that depend on `id`, each listed once.
    pub fn dependents_of(&self, id: DescriptorId) -> Vec<DescriptorId> {
        let mut dependents: Vec<DescriptorId> = self
            .edges()
            .filter(|e| e.provider == id && e.consumer != id)
            .map(|e| e.consumer)
            .collect();
        dependents.dedup();
        dependents
    }
}

/// Decorators of each capability, in identity order.
fn decorators_by_capability(set: &DescriptorSet) -> BTreeMap<String, Vec<DescriptorId>> {
    let mut grouped: BTreeMap<String, Vec<DescriptorId>> = BTreeMap::new();
    for (id, descriptor) in set.iter() {
        if let ComponentShape::Decorator { decorates } = &descriptor.shape {
            for decl in decorates {
                grouped.entry(decl.target.to_string()).or_default().push(id);
            }
        }
    }
    grouped
}

fn decorator_inner_positions(descriptor: &ComponentDescriptor) -> Vec<usize> {
    match &descriptor.shape {
        ComponentShape::Decorator { decorates } => {
            decorates.iter().map(|d| d.inner_position).collect()
        }
        _ => Vec::new(),
    }
}

/// Pure function selecting providers for one entry.
///
/// Keyed entries match only providers registered under that key; unkeyed
/// entries match only unkeyed providers. A single entry with several
/// candidates takes the last by identity, mirroring a container where the
/// last registration wins.
fn resolve(
    set: &DescriptorSet,
    consumer: DescriptorId,
    dependency: &DependencyRef,
) -> Vec<DescriptorId> {
    let candidates: Vec<DescriptorId> = set
        .providers_of(&dependency.capability)
        .into_iter()
        .filter(|id| {
            let provider = set.get(*id);
            match &dependency.key {
                Some(key) => provider.service_keys.contains(key),
                None => provider.service_keys.is_empty(),
            }
        })
        .collect();

    match dependency.kind {
        DependencyKind::Collection => candidates.into_iter().filter(|id| *id != consumer).collect(),
        DependencyKind::Single | DependencyKind::Deferred => {
            candidates.last().copied().into_iter().collect()
        }
    }
}

fn report_resolution(
    set: &DescriptorSet,
    consumer: &ComponentDescriptor,
    dependency: &DependencyRef,
    providers: &[DescriptorId],
    diagnostics: &mut Diagnostics,
) {
    if !providers.is_empty() {
        return;
    }
    let location = Location::new(&consumer.origin, &consumer.identity).with_member(&dependency.parameter);

    let diagnostic = match (&dependency.key, dependency.kind) {
        (Some(key), _) => Diagnostic::structural(
            DiagnosticCode::UNRESOLVED_KEYED_DEPENDENCY,
            format!(
                "`{}` requires `{}` with key \"{}\" but no component is registered under that key",
                consumer.identity, dependency.capability, key
            ),
        ),
        (None, DependencyKind::Collection) => Diagnostic::info(
            DiagnosticCode::EMPTY_COLLECTION,
            format!(
                "`{}` injects every `{}` but none are registered; it will receive an empty collection",
                consumer.identity, dependency.capability
            ),
        ),
        (None, _) => {
            let hint = set
                .find(&dependency.capability.to_string())
                .filter(|d| d.shape.is_excluded_factory())
                .map(|d| format!("; inject `{}` instead", factory_capability_name(&d.type_ref)))
                .unwrap_or_default();
            Diagnostic::structural(
                DiagnosticCode::UNRESOLVED_DEPENDENCY,
                format!(
                    "`{}` requires `{}` but no component provides it{}",
                    consumer.identity, dependency.capability, hint
                ),
            )
        }
    };

    diagnostics.push(
        diagnostic
            .at(location)
            .involving([consumer.identity.clone(), dependency.capability.to_string()]),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::testing::{depends_on, descriptor};
    use crate::core::Lifetime;
    use crate::model::TypeRef;

    fn with_capability(mut d: ComponentDescriptor, capability: &str) -> ComponentDescriptor {
        d.capabilities.push(TypeRef::simple(capability));
        d
    }

    #[test]
    fn test_collection_resolves_to_all_providers() {
        let set = DescriptorSet::new(vec![
            with_capability(descriptor("EmailHandler", Lifetime::Singleton), "Handler"),
            with_capability(descriptor("SmsHandler", Lifetime::Singleton), "Handler"),
            depends_on(
                descriptor("Dispatcher", Lifetime::Singleton),
                "Handler",
                DependencyKind::Collection,
            ),
        ]);
        let mut diagnostics = Diagnostics::new();
        let graph = DependencyGraph::build(&set, &mut diagnostics);

        let dispatcher = set.id_of("Dispatcher").unwrap();
        assert_eq!(graph.edges_from(dispatcher).len(), 2);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_empty_collection_is_advisory() {
        let set = DescriptorSet::new(vec![depends_on(
            descriptor("Dispatcher", Lifetime::Singleton),
            "Handler",
            DependencyKind::Collection,
        )]);
        let mut diagnostics = Diagnostics::new();
        DependencyGraph::build(&set, &mut diagnostics);

        assert!(!diagnostics.has_errors());
        assert_eq!(diagnostics.with_code(DiagnosticCode::EMPTY_COLLECTION).count(), 1);
    }

    #[test]
    fn test_unresolved_keyed_dependency_is_structural() {
        let mut consumer = depends_on(
            descriptor("Checkout", Lifetime::Singleton),
            "Cache",
            DependencyKind::Single,
        );
        consumer.dependencies[0].key = Some("redis".into());
        let mut memory = with_capability(descriptor("MemoryCache", Lifetime::Singleton), "Cache");
        memory.service_keys = vec!["memory".into()];

        let set = DescriptorSet::new(vec![consumer, memory]);
        let mut diagnostics = Diagnostics::new();
        let graph = DependencyGraph::build(&set, &mut diagnostics);

        assert!(diagnostics.has_errors());
        assert_eq!(
            diagnostics
                .with_code(DiagnosticCode::UNRESOLVED_KEYED_DEPENDENCY)
                .count(),
            1
        );
        assert!(graph.edges_from(set.id_of("Checkout").unwrap()).is_empty());
    }

    #[test]
    fn test_keyed_dependency_picks_matching_key() {
        let mut consumer = depends_on(
            descriptor("Checkout", Lifetime::Singleton),
            "Cache",
            DependencyKind::Single,
        );
        consumer.dependencies[0].key = Some("redis".into());
        let mut redis = with_capability(descriptor("RedisCache", Lifetime::Singleton), "Cache");
        redis.service_keys = vec!["redis".into()];
        let plain = with_capability(descriptor("MemoryCache", Lifetime::Singleton), "Cache");

        let set = DescriptorSet::new(vec![consumer, redis, plain]);
        let mut diagnostics = Diagnostics::new();
        let graph = DependencyGraph::build(&set, &mut diagnostics);

        let checkout = set.id_of("Checkout").unwrap();
        assert_eq!(graph.providers_for(checkout, 0), &[set.id_of("RedisCache").unwrap()]);
    }

    #[test]
    fn test_deferred_edges_are_marked() {
        let set = DescriptorSet::new(vec![
            descriptor("Clock", Lifetime::Singleton),
            depends_on(
                descriptor("Report", Lifetime::Singleton),
                "Clock",
                DependencyKind::Deferred,
            ),
        ]);
        let mut diagnostics = Diagnostics::new();
        let graph = DependencyGraph::build(&set, &mut diagnostics);
        let report = set.id_of("Report").unwrap();
        assert_eq!(graph.edges_from(report).len(), 1);
        assert_eq!(graph.direct_edges_from(report).count(), 0);
    }

    #[test]
    fn test_single_dependency_without_provider() {
        let set = DescriptorSet::new(vec![depends_on(
            descriptor("Report", Lifetime::Singleton),
            "Clock",
            DependencyKind::Single,
        )]);
        let mut diagnostics = Diagnostics::new();
        DependencyGraph::build(&set, &mut diagnostics);
        assert_eq!(
            diagnostics
                .with_code(DiagnosticCode::UNRESOLVED_DEPENDENCY)
                .count(),
            1
        );
    }

    #[test]
    fn test_consumer_of_decorated_capability_reaches_the_decorator() {
        let mut logging = depends_on(
            depends_on(
                with_capability(descriptor("LoggingRepo", Lifetime::Singleton), "Repo"),
                "Repo",
                DependencyKind::Single,
            ),
            "Audit",
            DependencyKind::Single,
        );
        logging.shape = ComponentShape::Decorator {
            decorates: vec![crate::core::DecoratorDecl {
                target: TypeRef::simple("Repo"),
                order: 0,
                inner_position: 0,
            }],
        };
        let set = DescriptorSet::new(vec![
            with_capability(descriptor("SqlRepo", Lifetime::Singleton), "Repo"),
            with_capability(descriptor("AuditLog", Lifetime::Singleton), "Audit"),
            logging,
            depends_on(
                descriptor("Checkout", Lifetime::Singleton),
                "Repo",
                DependencyKind::Single,
            ),
        ]);
        let mut diagnostics = Diagnostics::new();
        let graph = DependencyGraph::build(&set, &mut diagnostics);

        let targets = |from: &str| -> Vec<&str> {
            graph
                .edges_from(set.id_of(from).unwrap())
                .iter()
                .map(|e| set.get(e.provider).identity.as_str())
                .collect()
        };
        assert_eq!(targets("Checkout"), vec!["SqlRepo", "LoggingRepo"]);
        assert_eq!(targets("LoggingRepo"), vec!["AuditLog"]);
        assert!(diagnostics.is_empty());
    }
}
