//! Construction cycle detection.

use super::builder::DependencyGraph;
use crate::core::{DescriptorId, DescriptorSet};
use crate::diagnostics::{Diagnostic, DiagnosticCode, Diagnostics, Location};

/// A cycle path whose first and last entries are the same descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cycle {
    pub path: Vec<DescriptorId>,
}

impl Cycle {
    /// Render as `A → B → C → A`.
    pub fn render(&self, set: &DescriptorSet) -> String {
        self.identities(set).join(" → ")
    }

    pub fn identities(&self, set: &DescriptorSet) -> Vec<String> {
        self.path
            .iter()
            .map(|id| set.get(*id).identity.clone())
            .collect()
    }

    /// Distinct members in traversal order.
    pub fn members(&self) -> &[DescriptorId] {
        &self.path[..self.path.len().saturating_sub(1)]
    }
}

struct CycleSearch<'a> {
    graph: &'a DependencyGraph,
    visited: Vec<bool>,
    on_stack: Vec<bool>,
    stack: Vec<DescriptorId>,
}

impl CycleSearch<'_> {
    /// Depth-first visit; returns the first back-edge cycle under `node`.
    fn visit(&mut self, node: DescriptorId, found: &mut Option<Cycle>) {
        self.visited[node.index()] = true;
        self.on_stack[node.index()] = true;
        self.stack.push(node);

        let graph = self.graph;
        for edge in graph.direct_edges_from(node) {
            let next = edge.provider;
            if !self.visited[next.index()] {
                self.visit(next, found);
            } else if self.on_stack[next.index()] && found.is_none() {
                if let Some(start) = self.stack.iter().position(|n| *n == next) {
                    let mut path = self.stack[start..].to_vec();
                    path.push(next);
                    *found = Some(Cycle { path });
                }
            }
        }

        self.stack.pop();
        self.on_stack[node.index()] = false;
    }
}

/// Find construction cycles among direct (non-deferred) edges.
///
/// Roots are visited in ascending identity order and edges in declared
/// order, so the same graph always yields the same paths. Each root reports
/// at most its first back-edge.
pub fn detect_cycles(set: &DescriptorSet, graph: &DependencyGraph) -> Vec<Cycle> {
    let mut search = CycleSearch {
        graph,
        visited: vec![false; set.len()],
        on_stack: vec![false; set.len()],
        stack: Vec::new(),
    };
    let mut cycles = Vec::new();

    for root in set.ids() {
        if search.visited[root.index()] {
            continue;
        }
        let mut found = None;
        search.visit(root, &mut found);
        cycles.extend(found);
    }

    cycles
}

/// Run detection and turn every cycle into a graph error.
pub fn report_cycles(set: &DescriptorSet, graph: &DependencyGraph, diagnostics: &mut Diagnostics) {
    for cycle in detect_cycles(set, graph) {
        let head = set.get(cycle.path[0]);
        let involved: Vec<String> = cycle
            .members()
            .iter()
            .map(|id| set.get(*id).identity.clone())
            .collect();
        diagnostics.push(
            Diagnostic::graph(
                DiagnosticCode::DEPENDENCY_CYCLE,
                format!("dependency cycle: {}", cycle.render(set)),
            )
            .at(Location::new(&head.origin, &head.identity))
            .involving(involved),
        );
    }
}
