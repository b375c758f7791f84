//! Decorator grouping and chain construction.

use crate::core::{ComponentShape, DescriptorSet};
use crate::diagnostics::{Diagnostic, DiagnosticCode, Diagnostics, Location};
use crate::model::TypeRef;
use serde::Serialize;
use std::collections::BTreeMap;

/// The wrapped construction of one implementation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecoratorChain {
    pub implementation: String,
    /// Nested construction text, outermost first: `Outer(Inner(Real))`.
    pub expression: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecoratorLayer {
    pub identity: String,
    pub order: i32,
    pub module: String,
}

/// Every decorator of one capability, innermost first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecoratorGroup {
    pub capability: String,
    pub decorators: Vec<DecoratorLayer>,
    pub chains: Vec<DecoratorChain>,
}

impl DecoratorGroup {
    /// Decorator identities, innermost first.
    pub fn identities(&self) -> Vec<&str> {
        self.decorators.iter().map(|l| l.identity.as_str()).collect()
    }

    /// Fold another module's group for the same capability into this one.
    ///
    /// Layers are re-sorted and every chain is re-rendered, so merging is
    /// order-independent.
    pub fn merge(&mut self, other: &DecoratorGroup) {
        for layer in &other.decorators {
            if !self.decorators.iter().any(|l| l.identity == layer.identity) {
                self.decorators.push(layer.clone());
            }
        }
        sort_layers(&mut self.decorators);

        for chain in &other.chains {
            if !self.chains.iter().any(|c| c.implementation == chain.implementation) {
                self.chains.push(chain.clone());
            }
        }
        self.chains.sort_by(|a, b| a.implementation.cmp(&b.implementation));

        let identities: Vec<String> = self.decorators.iter().map(|l| l.identity.clone()).collect();
        for chain in &mut self.chains {
            chain.expression = render_chain(&chain.implementation, &identities);
        }
    }

    /// Drop layers declared outside `module` and re-render every chain.
    pub fn retain_module(&mut self, module: &str) {
        self.decorators.retain(|l| l.module == module);
        let identities: Vec<String> = self.decorators.iter().map(|l| l.identity.clone()).collect();
        for chain in &mut self.chains {
            chain.expression = render_chain(&chain.implementation, &identities);
        }
    }
}

fn sort_layers(layers: &mut [DecoratorLayer]) {
    layers.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.identity.cmp(&b.identity)));
}

/// Wrap `real` in each layer, innermost first.
pub fn render_chain<S: AsRef<str>>(real: &str, layers: &[S]) -> String {
    layers
        .iter()
        .fold(real.to_string(), |inner, layer| format!("{}({})", layer.as_ref(), inner))
}

/// Group decorator declarations by target capability and build the chain
/// for every implementation of each decorated capability.
///
/// Layers sort ascending by declared order, then by identity, so the lowest
/// order sits closest to the real implementation.
pub fn resolve_decorators(set: &DescriptorSet, diagnostics: &mut Diagnostics) -> Vec<DecoratorGroup> {
    let mut grouped: BTreeMap<String, (TypeRef, Vec<DecoratorLayer>)> = BTreeMap::new();

    for (_, descriptor) in set.iter() {
        let ComponentShape::Decorator { decorates } = &descriptor.shape else {
            continue;
        };
        for decl in decorates {
            grouped
                .entry(decl.target.to_string())
                .or_insert_with(|| (decl.target.clone(), Vec::new()))
                .1
                .push(DecoratorLayer {
                    identity: descriptor.identity.clone(),
                    order: decl.order,
                    module: descriptor.origin.clone(),
                });
        }
    }

    let mut groups = Vec::with_capacity(grouped.len());
    for (capability, (target, mut layers)) in grouped {
        sort_layers(&mut layers);
        let identities: Vec<String> = layers.iter().map(|l| l.identity.clone()).collect();

        let chains: Vec<DecoratorChain> = set
            .providers_of(&target)
            .into_iter()
            .map(|id| {
                let real = &set.get(id).identity;
                DecoratorChain {
                    implementation: real.clone(),
                    expression: render_chain(real, &identities),
                }
            })
            .collect();

        if chains.is_empty() {
            if let Some(first) = layers.first() {
                diagnostics.push(
                    Diagnostic::info(
                        DiagnosticCode::ORPHANED_ATTRIBUTE,
                        format!(
                            "no implementation of `{}` to decorate; {} decorator(s) unused",
                            capability,
                            identities.len()
                        ),
                    )
                    .at(Location::new(&first.module, &first.identity))
                    .involving(identities.clone()),
                );
            }
        }

        tracing::debug!(
            capability = %capability,
            layers = layers.len(),
            implementations = chains.len(),
            "decorator chain resolved"
        );
        groups.push(DecoratorGroup {
            capability,
            decorators: layers,
            chains,
        });
    }

    groups
}
