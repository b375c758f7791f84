//! Factory partitioning.
//!
//! A component marked for factory generation is not registered directly.
//! Its qualifying constructors become creation methods on a generated
//! `<Type>Factory`, which takes only the runtime-supplied parameters and
//! resolves the injectable ones from a captured resolution context.

use crate::core::{
    ComponentDescriptor, ComponentShape, DependencyRef, Lifetime, LifetimeSource,
    PartitionedConstructor, Synthesis,
};
use crate::diagnostics::{Diagnostic, DiagnosticCode, Diagnostics, Location};
use crate::extraction::factory_capability_name;
use crate::model::TypeRef;
use serde::Serialize;

/// A parameter the caller passes to a creation method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuntimeParameter {
    /// Position in the constructor's parameter list.
    pub position: usize,
    pub name: String,
    pub ty: TypeRef,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreationMethod {
    pub name: String,
    /// Declaration index of the constructor this method calls.
    pub constructor: usize,
    /// Runtime-supplied parameters in original order.
    pub parameters: Vec<RuntimeParameter>,
    /// Injectable parameters threaded from the resolution context.
    pub injected: Vec<DependencyRef>,
}

/// One row of the factory table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FactoryDescriptor {
    /// Identity of the generated factory, `<Type>Factory`.
    pub identity: String,
    /// The component the factory builds.
    pub target: String,
    pub module: String,
    pub target_lifetime: Lifetime,
    pub methods: Vec<CreationMethod>,
}

/// Result of partitioning one descriptor list.
#[derive(Debug, Clone, Default)]
pub struct Partitioned {
    pub factories: Vec<FactoryDescriptor>,
    /// Generated factory components, resolvable as `<Type>Factory`.
    pub components: Vec<ComponentDescriptor>,
}

/// Name of the creation method for the `index`-th qualifying constructor.
pub fn creation_method_name(index: usize) -> String {
    match index {
        0 => "create".to_string(),
        n => format!("create_{}", n + 1),
    }
}

fn creation_method(index: usize, constructor: &PartitionedConstructor) -> CreationMethod {
    CreationMethod {
        name: creation_method_name(index),
        constructor: constructor.declaration_index,
        parameters: constructor
            .parameters
            .iter()
            .enumerate()
            .filter(|(_, p)| !p.is_injectable())
            .map(|(position, p)| RuntimeParameter {
                position,
                name: p.name.clone(),
                ty: p.ty.clone(),
            })
            .collect(),
        injected: constructor
            .parameters
            .iter()
            .filter_map(|p| p.dependency().cloned())
            .collect(),
    }
}

fn factory_component(target: &ComponentDescriptor, identity: &str) -> ComponentDescriptor {
    let type_ref = TypeRef::simple(identity);
    ComponentDescriptor {
        identity: identity.to_string(),
        type_ref: type_ref.clone(),
        origin: target.origin.clone(),
        capabilities: vec![type_ref],
        lifetime: Lifetime::Singleton,
        lifetime_source: LifetimeSource::Declared,
        dependencies: Vec::new(),
        constructor: Vec::new(),
        service_keys: Vec::new(),
        release_capability: None,
        hosted: false,
        shape: ComponentShape::Plain,
        synthesized: Some(Synthesis::Factory {
            target: target.identity.clone(),
        }),
    }
}

/// Emit a factory for every factory-shaped descriptor.
pub fn partition_factories(
    descriptors: &[ComponentDescriptor],
    diagnostics: &mut Diagnostics,
) -> Partitioned {
    let mut partitioned = Partitioned::default();

    for descriptor in descriptors {
        let ComponentShape::Factory { partition } = &descriptor.shape else {
            continue;
        };
        let identity = factory_capability_name(&descriptor.type_ref);

        if !partition.has_runtime_parameters() {
            diagnostics.push(
                Diagnostic::info(
                    DiagnosticCode::LOW_VALUE_FACTORY,
                    format!(
                        "`{}` is marked for factory generation but every constructor parameter is injectable; `{}` is generated anyway",
                        descriptor.identity, identity
                    ),
                )
                .at(Location::new(&descriptor.origin, &descriptor.identity))
                .involving([descriptor.identity.clone(), identity.clone()]),
            );
        }

        let methods: Vec<CreationMethod> = partition
            .constructors
            .iter()
            .enumerate()
            .map(|(index, constructor)| creation_method(index, constructor))
            .collect();

        tracing::debug!(
            factory = %identity,
            methods = methods.len(),
            "factory partitioned"
        );

        partitioned
            .components
            .push(factory_component(descriptor, &identity));
        partitioned.factories.push(FactoryDescriptor {
            identity,
            target: descriptor.identity.clone(),
            module: descriptor.origin.clone(),
            target_lifetime: descriptor.lifetime,
            methods,
        });
    }

    partitioned
}
