//! Graphviz export of the dependency graph.

use crate::core::DescriptorSet;
use crate::graph::DependencyGraph;
use petgraph::dot::Dot;
use petgraph::graph::{DiGraph, NodeIndex};

/// Build a petgraph view: one node per descriptor, one edge per resolved
/// dependency, labelled `direct` or `deferred`.
pub fn to_petgraph(set: &DescriptorSet, graph: &DependencyGraph) -> DiGraph<String, &'static str> {
    let mut view = DiGraph::with_capacity(set.len(), graph.edge_count());
    let nodes: Vec<NodeIndex> = set
        .iter()
        .map(|(_, d)| view.add_node(d.identity.clone()))
        .collect();

    for edge in graph.edges() {
        let label = if edge.deferred { "deferred" } else { "direct" };
        view.add_edge(
            nodes[edge.consumer.index()],
            nodes[edge.provider.index()],
            label,
        );
    }
    view
}

pub fn render_dot(set: &DescriptorSet, graph: &DependencyGraph) -> String {
    let view = to_petgraph(set, graph);
    format!("{}", Dot::new(&view))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::testing::{depends_on, descriptor};
    use crate::core::{DependencyKind, Lifetime};
    use crate::diagnostics::Diagnostics;

    #[test]
    fn test_dot_lists_nodes_and_labelled_edges() {
        let set = DescriptorSet::new(vec![
            descriptor("Clock", Lifetime::Singleton),
            depends_on(
                depends_on(
                    descriptor("Report", Lifetime::Singleton),
                    "Clock",
                    DependencyKind::Single,
                ),
                "Clock",
                DependencyKind::Deferred,
            ),
        ]);
        let graph = DependencyGraph::build(&set, &mut Diagnostics::new());
        let view = to_petgraph(&set, &graph);
        assert_eq!(view.node_count(), 2);
        assert_eq!(view.edge_count(), 2);

        let dot = render_dot(&set, &graph);
        assert!(dot.starts_with("digraph {"));
        assert!(dot.contains("\"Report\""));
        assert!(dot.contains("\"deferred\""));
    }
}
