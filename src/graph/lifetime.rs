//! Lifetime and captive-dependency validation.

use super::builder::DependencyGraph;
use crate::config::WiremapConfig;
use crate::core::DescriptorSet;
use crate::diagnostics::{Diagnostic, DiagnosticCode, Diagnostics, Location};
use std::collections::BTreeSet;

/// Check every direct edge for a consumer outliving its provider.
///
/// A disposable provider makes it a captive dependency; otherwise it is a
/// plain lifetime mismatch. Each has its own configured severity. If either
/// side's lifetime was defaulted rather than declared the edge is skipped.
pub fn validate_lifetimes(
    set: &DescriptorSet,
    graph: &DependencyGraph,
    config: &WiremapConfig,
    diagnostics: &mut Diagnostics,
) {
    let mut reported = BTreeSet::new();

    for (consumer_id, consumer) in set.iter() {
        for edge in graph.direct_edges_from(consumer_id) {
            let provider = set.get(edge.provider);
            if !consumer.has_declared_lifetime() || !provider.has_declared_lifetime() {
                continue;
            }
            if !consumer.lifetime.outlives(provider.lifetime) {
                continue;
            }
            if !reported.insert((consumer_id, edge.provider)) {
                continue;
            }

            let parameter = &consumer.dependencies[edge.dependency].parameter;
            let location = Location::new(&consumer.origin, &consumer.identity).with_member(parameter);

            let diagnostic = match &provider.release_capability {
                Some(release) => Diagnostic::lifetime(
                    config.captive_dependency,
                    DiagnosticCode::CAPTIVE_DEPENDENCY,
                    format!(
                        "captive dependency: {} `{}` holds {} `{}`, which is released through `{}`",
                        consumer.lifetime, consumer.identity, provider.lifetime, provider.identity, release
                    ),
                ),
                None => Diagnostic::lifetime(
                    config.lifetime_mismatch,
                    DiagnosticCode::LIFETIME_MISMATCH,
                    format!(
                        "lifetime mismatch: {} `{}` holds shorter-lived {} `{}`",
                        consumer.lifetime, consumer.identity, provider.lifetime, provider.identity
                    ),
                ),
            };

            if let Some(diagnostic) = diagnostic {
                diagnostics.push(
                    diagnostic
                        .at(location)
                        .involving([consumer.identity.clone(), provider.identity.clone()]),
                );
            }
        }
    }
}
