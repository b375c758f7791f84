//! Specialization of open generic decorators.

use crate::core::{ComponentDescriptor, Synthesis};
use crate::diagnostics::{Diagnostic, DiagnosticCode, Diagnostics, Location};
use crate::extraction::{Extractor, OpenDecorator};
use crate::model::{Attribute, TypeRef, TypeSource};
use std::collections::{BTreeMap, BTreeSet};

/// Close every open decorator over the specializations it decorates.
///
/// Each decorated capability pattern (e.g. `Repository<T>`) is matched
/// against the capabilities of every provider. Each distinct set of type
/// arguments yields one closed decorator descriptor. A match that leaves a
/// type parameter unbound is an ambiguous type argument.
pub fn expand_open_decorators<S: TypeSource>(
    extractor: &Extractor<'_, S>,
    open: &[OpenDecorator],
    descriptors: &[ComponentDescriptor],
    diagnostics: &mut Diagnostics,
) -> Vec<ComponentDescriptor> {
    let mut closed = Vec::new();

    for decorator in open {
        let model = &decorator.model;
        let open_identity = model.self_ref().to_string();
        let location = Location::new(&decorator.origin, &open_identity);
        let (specializations, unbound) = match_specializations(model.attributes.as_slice(), &model.type_parameters, descriptors);

        for capability in &unbound {
            diagnostics.push(
                Diagnostic::graph(
                    DiagnosticCode::AMBIGUOUS_TYPE_ARGUMENT,
                    format!(
                        "decorator `{}` matches `{}` but not every type parameter of {:?} is determined by it",
                        open_identity, capability, model.type_parameters
                    ),
                )
                .at(location.clone())
                .involving([open_identity.clone(), capability.clone()]),
            );
        }

        if specializations.is_empty() && unbound.is_empty() {
            diagnostics.push(
                Diagnostic::info(
                    DiagnosticCode::ORPHANED_ATTRIBUTE,
                    format!("generic decorator `{}` matches no registered specialization", open_identity),
                )
                .at(location.clone())
                .involving([open_identity.clone()]),
            );
        }

        for arguments in specializations {
            let bindings: BTreeMap<String, TypeRef> = model
                .type_parameters
                .iter()
                .cloned()
                .zip(arguments)
                .collect();
            if let Some(mut descriptor) =
                extractor.describe(model, &decorator.origin, &bindings, decorator.is_current, diagnostics)
            {
                tracing::debug!(
                    open = %open_identity,
                    closed = %descriptor.identity,
                    "generic decorator specialized"
                );
                descriptor.synthesized = Some(Synthesis::ClosedDecorator {
                    open: open_identity.clone(),
                });
                closed.push(descriptor);
            }
        }
    }

    closed
}

/// Distinct argument lists for `params`, plus capabilities that matched
/// without binding every parameter.
fn match_specializations(
    attributes: &[Attribute],
    params: &[String],
    descriptors: &[ComponentDescriptor],
) -> (BTreeSet<Vec<TypeRef>>, BTreeSet<String>) {
    let mut specializations = BTreeSet::new();
    let mut unbound = BTreeSet::new();

    let targets = attributes.iter().filter_map(|a| match a {
        Attribute::DecoratorFor { capability, .. } => Some(capability),
        _ => None,
    });

    for target in targets {
        for provider in descriptors.iter().filter(|d| d.is_provider()) {
            for capability in &provider.capabilities {
                let mut bindings = BTreeMap::new();
                if !target.unify(capability, params, &mut bindings) {
                    continue;
                }
                let arguments: Option<Vec<TypeRef>> =
                    params.iter().map(|p| bindings.get(p).cloned()).collect();
                match arguments {
                    Some(arguments) => {
                        specializations.insert(arguments);
                    }
                    None => {
                        unbound.insert(capability.to_string());
                    }
                }
            }
        }
    }

    (specializations, unbound)
}
