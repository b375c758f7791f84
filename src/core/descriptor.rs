//! Component descriptors and the arena that owns them.
//!
//! Descriptors are produced once per extraction pass and never mutated.
//! Every later stage refers to them by [`DescriptorId`], an index into the
//! [`DescriptorSet`] arena, so the dependency graph is a set of index pairs
//! rather than a web of owned pointers.

use super::lifetime::{Lifetime, LifetimeSource};
use crate::model::TypeRef;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Index of a descriptor inside a [`DescriptorSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DescriptorId(pub usize);

impl DescriptorId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// How a dependency-list entry is injected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyKind {
    /// Exactly one provider, constructed before the consumer.
    Single,
    /// Every provider of the capability.
    Collection,
    /// Resolved later through lazy or provider indirection.
    Deferred,
}

/// One entry of a descriptor's constructor dependency list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyRef {
    /// Position in the constructor's parameter list.
    pub position: usize,
    pub parameter: String,
    /// The parameter type as declared, e.g. `Vec<Handler>`.
    pub declared: TypeRef,
    /// The capability being resolved, wrappers removed.
    pub capability: TypeRef,
    pub key: Option<String>,
    pub kind: DependencyKind,
}

/// Classification of a constructor parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "class", rename_all = "snake_case")]
pub enum ParameterClass {
    Injectable { dependency: DependencyRef },
    RuntimeSupplied,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassifiedParameter {
    pub name: String,
    pub ty: TypeRef,
    pub class: ParameterClass,
}

impl ClassifiedParameter {
    pub fn is_injectable(&self) -> bool {
        matches!(self.class, ParameterClass::Injectable { .. })
    }

    pub fn dependency(&self) -> Option<&DependencyRef> {
        match &self.class {
            ParameterClass::Injectable { dependency } => Some(dependency),
            ParameterClass::RuntimeSupplied => None,
        }
    }
}

/// A constructor with every parameter classified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartitionedConstructor {
    /// Source declaration index among the type's constructors.
    pub declaration_index: usize,
    pub parameters: Vec<ClassifiedParameter>,
}

impl PartitionedConstructor {
    pub fn injectable_count(&self) -> usize {
        self.parameters.iter().filter(|p| p.is_injectable()).count()
    }

    pub fn runtime_supplied(&self) -> impl Iterator<Item = &ClassifiedParameter> {
        self.parameters.iter().filter(|p| !p.is_injectable())
    }

    pub fn is_fully_injectable(&self) -> bool {
        self.parameters.iter().all(|p| p.is_injectable())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecoratorDecl {
    pub target: TypeRef,
    pub order: i32,
    /// Constructor position that receives the decorated instance.
    pub inner_position: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct InterceptionDecl {
    /// Applied to every method without an override.
    pub class_level: Vec<TypeRef>,
    /// Method name to interceptor list; replaces the class-level list.
    pub per_method: BTreeMap<String, Vec<TypeRef>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FactoryPartition {
    /// Qualifying constructors in declaration order.
    pub constructors: Vec<PartitionedConstructor>,
}

impl FactoryPartition {
    pub fn has_runtime_parameters(&self) -> bool {
        self.constructors
            .iter()
            .any(|c| c.runtime_supplied().next().is_some())
    }
}

/// The dispatch shape of a component, resolved once at extraction time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum ComponentShape {
    Plain,
    Decorator { decorates: Vec<DecoratorDecl> },
    Intercepted { interception: InterceptionDecl },
    Factory { partition: FactoryPartition },
    Options { section: String },
}

impl ComponentShape {
    pub fn tag(&self) -> &'static str {
        match self {
            ComponentShape::Plain => "plain",
            ComponentShape::Decorator { .. } => "decorator",
            ComponentShape::Intercepted { .. } => "intercepted",
            ComponentShape::Factory { .. } => "factory",
            ComponentShape::Options { .. } => "options",
        }
    }

    /// A factory-marked component with at least one runtime-supplied
    /// parameter. It is reachable only through its generated factory.
    pub fn is_excluded_factory(&self) -> bool {
        matches!(self, ComponentShape::Factory { partition } if partition.has_runtime_parameters())
    }
}

/// Descriptors that did not come straight from a type in the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Synthesis {
    /// A closed specialization of an open generic decorator.
    ClosedDecorator { open: String },
    /// The generated factory for a factory-shaped component.
    Factory { target: String },
}

/// An immutable, fully-resolved view of one component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComponentDescriptor {
    /// Globally unique qualified name.
    pub identity: String,
    pub type_ref: TypeRef,
    /// Module that declared the type.
    pub origin: String,
    pub capabilities: Vec<TypeRef>,
    pub lifetime: Lifetime,
    pub lifetime_source: LifetimeSource,
    /// Constructor dependency list in declared order.
    pub dependencies: Vec<DependencyRef>,
    /// Parameter list of the selected constructor.
    pub constructor: Vec<ClassifiedParameter>,
    pub service_keys: Vec<String>,
    /// Resource-release capability, when the component is disposable.
    pub release_capability: Option<String>,
    pub hosted: bool,
    pub shape: ComponentShape,
    pub synthesized: Option<Synthesis>,
}

impl ComponentDescriptor {
    pub fn is_disposable(&self) -> bool {
        self.release_capability.is_some()
    }

    pub fn has_declared_lifetime(&self) -> bool {
        self.lifetime_source == LifetimeSource::Declared
    }

    pub fn provides(&self, capability: &TypeRef) -> bool {
        self.capabilities.iter().any(|c| c == capability)
    }

    /// Whether the container may hand this descriptor out for a capability.
    pub fn is_provider(&self) -> bool {
        !matches!(self.shape, ComponentShape::Decorator { .. }) && !self.shape.is_excluded_factory()
    }
}

impl fmt::Display for ComponentDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.identity, self.lifetime)
    }
}

/// Arena of descriptors ordered by identity.
///
/// Because ids are assigned after sorting, iterating ids in ascending order
/// visits descriptors alphabetically by identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DescriptorSet {
    descriptors: Vec<ComponentDescriptor>,
    #[serde(skip)]
    by_identity: BTreeMap<String, DescriptorId>,
}

impl DescriptorSet {
    /// Build the arena. Later duplicates of an identity are dropped.
    pub fn new(mut descriptors: Vec<ComponentDescriptor>) -> Self {
        descriptors.sort_by(|a, b| a.identity.cmp(&b.identity));
        descriptors.dedup_by(|later, earlier| later.identity == earlier.identity);
        let by_identity = descriptors
            .iter()
            .enumerate()
            .map(|(i, d)| (d.identity.clone(), DescriptorId(i)))
            .collect();
        Self {
            descriptors,
            by_identity,
        }
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn get(&self, id: DescriptorId) -> &ComponentDescriptor {
        &self.descriptors[id.0]
    }

    pub fn id_of(&self, identity: &str) -> Option<DescriptorId> {
        self.by_identity.get(identity).copied()
    }

    pub fn find(&self, identity: &str) -> Option<&ComponentDescriptor> {
        self.id_of(identity).map(|id| self.get(id))
    }

    pub fn ids(&self) -> impl Iterator<Item = DescriptorId> {
        (0..self.descriptors.len()).map(DescriptorId)
    }

    pub fn iter(&self) -> impl Iterator<Item = (DescriptorId, &ComponentDescriptor)> {
        self.descriptors
            .iter()
            .enumerate()
            .map(|(i, d)| (DescriptorId(i), d))
    }

    pub fn descriptors(&self) -> &[ComponentDescriptor] {
        &self.descriptors
    }

    /// Every descriptor that may be resolved for `capability`, by identity.
    pub fn providers_of(&self, capability: &TypeRef) -> Vec<DescriptorId> {
        self.iter()
            .filter(|(_, d)| d.is_provider() && d.provides(capability))
            .map(|(id, _)| id)
            .collect()
    }
}
