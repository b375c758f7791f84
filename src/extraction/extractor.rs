//! Type model extraction.
//!
//! Turns the raw type universe into immutable component descriptors. This is
//! the only stage that reads attributes: each eligible type is tagged with a
//! [`ComponentShape`] here and every later stage branches on that tag.

use super::capabilities::{expand_capabilities, CapabilityUniverse};
use super::constructor::select_best_constructor;
use crate::config::WiremapConfig;
use crate::core::{
    ComponentDescriptor, ComponentShape, DecoratorDecl, DependencyKind, DependencyRef,
    FactoryPartition, InterceptionDecl, Lifetime, LifetimeSource, PartitionedConstructor,
};
use crate::diagnostics::{Diagnostic, DiagnosticCode, Diagnostics, Location};
use crate::factory::ParameterClassifier;
use crate::model::{Accessibility, Attribute, TypeModel, TypeRef, TypeSource};
use std::collections::{BTreeMap, BTreeSet};

/// An open generic decorator waiting for specializations.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenDecorator {
    pub model: TypeModel,
    pub origin: String,
    /// Whether the declaring module is the one being compiled.
    pub is_current: bool,
}

/// Everything one discovery pass produces.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub descriptors: Vec<ComponentDescriptor>,
    pub open_decorators: Vec<OpenDecorator>,
}

#[derive(Debug, PartialEq, Eq)]
enum Eligibility {
    Eligible,
    /// Would qualify but is hidden behind its module boundary.
    Inaccessible,
    Skip(&'static str),
}

/// Attributes of one type, gathered before shape selection.
#[derive(Debug, Default)]
struct DeclaredAttributes {
    lifetime: Option<Lifetime>,
    register_as: Option<Vec<TypeRef>>,
    decorates: Vec<(TypeRef, i32)>,
    interception: InterceptionDecl,
    generate_factory: bool,
    keys: BTreeSet<String>,
    hosted: bool,
    options: Option<String>,
}

impl DeclaredAttributes {
    fn collect(attributes: &[Attribute], bindings: &BTreeMap<String, TypeRef>) -> Self {
        let mut declared = Self::default();
        for attribute in attributes {
            match attribute {
                Attribute::Lifetime { value } => declared.lifetime = Some(*value),
                Attribute::Exclude => {}
                Attribute::RegisterAs { capabilities } => declared
                    .register_as
                    .get_or_insert_with(Vec::new)
                    .extend(capabilities.iter().map(|c| c.substitute(bindings))),
                Attribute::DecoratorFor { capability, order } => declared
                    .decorates
                    .push((capability.substitute(bindings), *order)),
                Attribute::Intercept { interceptors } => declared
                    .interception
                    .class_level
                    .extend(interceptors.iter().cloned()),
                Attribute::InterceptMethod {
                    method,
                    interceptors,
                } => {
                    declared
                        .interception
                        .per_method
                        .insert(method.clone(), interceptors.clone());
                }
                Attribute::GenerateFactory => declared.generate_factory = true,
                Attribute::Keyed { key } => {
                    declared.keys.insert(key.clone());
                }
                Attribute::Hosted => declared.hosted = true,
                Attribute::Options { section } => declared.options = Some(section.clone()),
            }
        }
        declared
    }

    fn wants_interception(&self) -> bool {
        !self.interception.class_level.is_empty() || !self.interception.per_method.is_empty()
    }
}

pub struct Extractor<'a, S: TypeSource> {
    source: &'a S,
    config: &'a WiremapConfig,
    capabilities: CapabilityUniverse,
}

impl<'a, S: TypeSource> Extractor<'a, S> {
    pub fn new(source: &'a S, config: &'a WiremapConfig) -> Self {
        Self {
            source,
            config,
            capabilities: CapabilityUniverse::scan(source, config),
        }
    }

    pub fn capabilities(&self) -> &CapabilityUniverse {
        &self.capabilities
    }

    /// Run the discovery pass over every visible module.
    pub fn extract(&self, diagnostics: &mut Diagnostics) -> Extraction {
        let current = self.source.current_module();
        let mut extraction = Extraction::default();

        for module in self.source.modules() {
            let is_current = module.name == current;
            let mut contributed = Vec::new();

            for ty in &module.types {
                match eligibility(ty, is_current) {
                    Eligibility::Eligible => {}
                    Eligibility::Inaccessible => {
                        diagnostics.push(
                            Diagnostic::structural(
                                DiagnosticCode::INACCESSIBLE_CROSS_MODULE,
                                format!(
                                    "`{}` in module `{}` would be registered but is internal to its module; make it public or exclude it",
                                    ty.name, module.name
                                ),
                            )
                            .at(Location::new(&module.name, &ty.name))
                            .involving([ty.name.clone()]),
                        );
                        continue;
                    }
                    Eligibility::Skip(reason) => {
                        tracing::trace!(ty = %ty.name, "skipping type: {}", reason);
                        continue;
                    }
                }

                if ty.is_open_generic() {
                    self.handle_open_generic(ty, &module.name, is_current, &mut extraction, diagnostics);
                    if ty.attributes.iter().any(|a| matches!(a, Attribute::DecoratorFor { .. })) {
                        contributed.push(ty.name.clone());
                    }
                    continue;
                }

                if let Some(descriptor) =
                    self.describe(ty, &module.name, &BTreeMap::new(), is_current, diagnostics)
                {
                    contributed.push(descriptor.identity.clone());
                    extraction.descriptors.push(descriptor);
                }
            }

            if !is_current && !module.has_registry && !contributed.is_empty() {
                diagnostics.push(
                    Diagnostic::structural(
                        DiagnosticCode::MISSING_COMPANION_REGISTRY,
                        format!(
                            "referenced module `{}` contributes {} component(s) but has no generated registry",
                            module.name,
                            contributed.len()
                        ),
                    )
                    .at(Location::new(&module.name, &module.name))
                    .involving(contributed),
                );
            }
        }

        tracing::debug!(
            descriptors = extraction.descriptors.len(),
            open_decorators = extraction.open_decorators.len(),
            "extraction complete"
        );
        extraction
    }

    fn handle_open_generic(
        &self,
        ty: &TypeModel,
        origin: &str,
        is_current: bool,
        extraction: &mut Extraction,
        diagnostics: &mut Diagnostics,
    ) {
        let is_decorator = ty
            .attributes
            .iter()
            .any(|a| matches!(a, Attribute::DecoratorFor { .. }));
        let is_factory = ty
            .attributes
            .iter()
            .any(|a| matches!(a, Attribute::GenerateFactory));

        if is_decorator {
            extraction.open_decorators.push(OpenDecorator {
                model: ty.clone(),
                origin: origin.to_string(),
                is_current,
            });
        } else if is_factory {
            diagnostics.push(
                Diagnostic::graph(
                    DiagnosticCode::AMBIGUOUS_TYPE_ARGUMENT,
                    format!(
                        "cannot generate a factory for open generic `{}`: type arguments {:?} are not determined",
                        ty.self_ref(),
                        ty.type_parameters
                    ),
                )
                .at(Location::new(origin, &ty.name))
                .involving([ty.self_ref().to_string()]),
            );
        } else {
            tracing::trace!(ty = %ty.name, "open generic type requires specialization");
        }
    }

    /// Build the descriptor for one type, with type parameters bound by
    /// `bindings`. Returns `None` when the type cannot be constructed.
    pub fn describe(
        &self,
        ty: &TypeModel,
        origin: &str,
        bindings: &BTreeMap<String, TypeRef>,
        is_current: bool,
        diagnostics: &mut Diagnostics,
    ) -> Option<ComponentDescriptor> {
        let type_ref = ty.self_ref().substitute(bindings);
        let identity = type_ref.to_string();
        let location = Location::new(origin, &identity);
        let attributes = DeclaredAttributes::collect(&ty.attributes, bindings);

        let implements: Vec<TypeRef> = ty.implements.iter().map(|i| i.substitute(bindings)).collect();
        let expanded = expand_capabilities(self.source, &implements);
        let release_capability = expanded
            .iter()
            .find(|c| self.config.disposal_capabilities.contains(&c.name))
            .map(|c| c.to_string());
        let mut implemented: Vec<TypeRef> = expanded
            .into_iter()
            .filter(|c| !self.config.is_ignored_capability(&c.name))
            .collect();
        if !implemented.contains(&type_ref) {
            implemented.push(type_ref.clone());
        }

        let capabilities = self.narrow_capabilities(&attributes, &implemented, &location, diagnostics);

        let classifier = ParameterClassifier::new(self.config, &self.capabilities);
        let constructors: Vec<PartitionedConstructor> = ty
            .constructors
            .iter()
            .enumerate()
            .filter(|(_, c)| constructor_accessible(c.accessibility, is_current))
            .map(|(index, c)| PartitionedConstructor {
                declaration_index: index,
                parameters: c
                    .parameters
                    .iter()
                    .enumerate()
                    .map(|(position, p)| classifier.classify(position, p, bindings))
                    .collect(),
            })
            .collect();

        let (lifetime, lifetime_source) = match attributes.lifetime {
            Some(lifetime) => (lifetime, LifetimeSource::Declared),
            None => (self.config.default_lifetime, LifetimeSource::Defaulted),
        };

        let (shape, selected) = self.select_shape(
            &identity,
            &attributes,
            &implemented,
            &constructors,
            &location,
            diagnostics,
        )?;

        let dependencies = match &shape {
            ComponentShape::Factory { partition } if partition.has_runtime_parameters() => {
                factory_dependencies(partition)
            }
            _ => selected
                .parameters
                .iter()
                .filter_map(|p| p.dependency().cloned())
                .collect(),
        };

        Some(ComponentDescriptor {
            identity,
            type_ref,
            origin: origin.to_string(),
            capabilities,
            lifetime,
            lifetime_source,
            dependencies,
            constructor: selected.parameters.clone(),
            service_keys: attributes.keys.iter().cloned().collect(),
            release_capability,
            hosted: attributes.hosted,
            shape,
            synthesized: None,
        })
    }

    fn narrow_capabilities(
        &self,
        attributes: &DeclaredAttributes,
        implemented: &[TypeRef],
        location: &Location,
        diagnostics: &mut Diagnostics,
    ) -> Vec<TypeRef> {
        let Some(register_as) = &attributes.register_as else {
            return implemented.to_vec();
        };

        let mut narrowed = Vec::new();
        for capability in register_as {
            if implemented.contains(capability) {
                if !narrowed.contains(capability) {
                    narrowed.push(capability.clone());
                }
            } else {
                diagnostics.push(
                    Diagnostic::info(
                        DiagnosticCode::ORPHANED_ATTRIBUTE,
                        format!(
                            "`{}` is registered as `{}`, which it does not implement; entry ignored",
                            location.type_name, capability
                        ),
                    )
                    .at(location.clone())
                    .involving([location.type_name.clone()]),
                );
            }
        }

        if narrowed.is_empty() {
            implemented.to_vec()
        } else {
            narrowed
        }
    }

    /// Resolve the shape tag by precedence and pick the constructing member.
    fn select_shape(
        &self,
        identity: &str,
        attributes: &DeclaredAttributes,
        implemented: &[TypeRef],
        constructors: &[PartitionedConstructor],
        location: &Location,
        diagnostics: &mut Diagnostics,
    ) -> Option<(ComponentShape, PartitionedConstructor)> {
        let mut requested: Vec<&'static str> = Vec::new();
        if !attributes.decorates.is_empty() {
            requested.push("decorator_for");
        }
        if attributes.generate_factory {
            requested.push("generate_factory");
        }
        if attributes.wants_interception() {
            requested.push("intercept");
        }
        if attributes.options.is_some() {
            requested.push("options");
        }

        let winner = requested.first().copied();
        for loser in requested.iter().skip(1) {
            diagnostics.push(orphaned(
                location,
                format!(
                    "attribute `{}` on `{}` is ignored: `{}` takes precedence",
                    loser,
                    identity,
                    winner.unwrap_or_default()
                ),
            ));
        }

        let injectable: Vec<PartitionedConstructor> = constructors
            .iter()
            .filter(|c| c.is_fully_injectable())
            .cloned()
            .collect();

        match winner {
            Some("decorator_for") => {
                for (label, set) in [("keyed", !attributes.keys.is_empty()), ("hosted", attributes.hosted)] {
                    if set {
                        diagnostics.push(orphaned(
                            location,
                            format!("attribute `{}` has no effect on decorator `{}`", label, identity),
                        ));
                    }
                }
                let Some(best) = select_best_constructor(&injectable).cloned() else {
                    diagnostics.push(orphaned(
                        location,
                        format!("decorator `{}` has no injectable constructor", identity),
                    ));
                    return None;
                };
                let decorates =
                    self.decorator_decls(identity, attributes, implemented, &best, location, diagnostics);
                if decorates.is_empty() {
                    return None;
                }
                Some((ComponentShape::Decorator { decorates }, best))
            }
            Some("generate_factory") => {
                let mut qualifying: Vec<PartitionedConstructor> = constructors
                    .iter()
                    .filter(|c| c.runtime_supplied().next().is_some())
                    .cloned()
                    .collect();
                if qualifying.is_empty() {
                    qualifying = injectable;
                }
                let best = select_best_constructor(&qualifying).cloned()?;
                Some((
                    ComponentShape::Factory {
                        partition: FactoryPartition {
                            constructors: qualifying,
                        },
                    },
                    best,
                ))
            }
            other => {
                let Some(best) = select_best_constructor(&injectable).cloned() else {
                    tracing::debug!(
                        component = identity,
                        "no constructor with only injectable parameters; not registered"
                    );
                    return None;
                };
                let shape = match other {
                    Some("intercept") => ComponentShape::Intercepted {
                        interception: attributes.interception.clone(),
                    },
                    Some("options") => ComponentShape::Options {
                        section: attributes.options.clone().unwrap_or_default(),
                    },
                    _ => ComponentShape::Plain,
                };
                Some((shape, best))
            }
        }
    }

    fn decorator_decls(
        &self,
        identity: &str,
        attributes: &DeclaredAttributes,
        implemented: &[TypeRef],
        constructor: &PartitionedConstructor,
        location: &Location,
        diagnostics: &mut Diagnostics,
    ) -> Vec<DecoratorDecl> {
        let mut decls = Vec::new();
        for (target, order) in &attributes.decorates {
            if !implemented.contains(target) {
                diagnostics.push(orphaned(
                    location,
                    format!("decorator `{}` does not implement `{}`", identity, target),
                ));
                continue;
            }
            let inner = constructor.parameters.iter().find_map(|p| {
                p.dependency()
                    .filter(|d| d.capability == *target && d.kind == DependencyKind::Single)
                    .map(|d| d.position)
            });
            match inner {
                Some(inner_position) => decls.push(DecoratorDecl {
                    target: target.clone(),
                    order: *order,
                    inner_position,
                }),
                None => diagnostics.push(orphaned(
                    location,
                    format!(
                        "decorator `{}` takes no `{}` parameter to wrap",
                        identity, target
                    ),
                )),
            }
        }
        decls
    }
}

fn orphaned(location: &Location, message: String) -> Diagnostic {
    Diagnostic::info(DiagnosticCode::ORPHANED_ATTRIBUTE, message)
        .at(location.clone())
        .involving([location.type_name.clone()])
}

/// Injectable parameters across every qualifying factory constructor.
fn factory_dependencies(partition: &FactoryPartition) -> Vec<DependencyRef> {
    let mut seen = BTreeSet::new();
    partition
        .constructors
        .iter()
        .flat_map(|c| c.parameters.iter().filter_map(|p| p.dependency()))
        .filter(|d| seen.insert((d.capability.clone(), d.key.clone(), d.kind)))
        .cloned()
        .collect()
}

fn constructor_accessible(accessibility: Accessibility, is_current: bool) -> bool {
    match accessibility {
        Accessibility::Public => true,
        Accessibility::Internal => is_current,
        Accessibility::Private => false,
    }
}

fn eligibility(ty: &TypeModel, is_current: bool) -> Eligibility {
    if ty.is_abstract {
        return Eligibility::Skip("abstract");
    }
    if ty.attributes.iter().any(|a| matches!(a, Attribute::Exclude)) {
        return Eligibility::Skip("excluded");
    }
    match ty.accessibility {
        Accessibility::Private => return Eligibility::Skip("private"),
        Accessibility::Internal if !is_current => {
            let would_qualify = ty
                .constructors
                .iter()
                .any(|c| c.accessibility != Accessibility::Private)
                && (!ty.implements.is_empty() || !ty.attributes.is_empty());
            return if would_qualify {
                Eligibility::Inaccessible
            } else {
                Eligibility::Skip("internal to another module")
            };
        }
        _ => {}
    }
    if !ty
        .constructors
        .iter()
        .any(|c| constructor_accessible(c.accessibility, is_current))
    {
        return Eligibility::Skip("no accessible constructor");
    }
    Eligibility::Eligible
}
