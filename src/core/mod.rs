//! Core data model shared by every compilation stage.

pub mod descriptor;
pub mod lifetime;

pub use descriptor::{
    ClassifiedParameter, ComponentDescriptor, ComponentShape, DecoratorDecl, DependencyKind,
    DependencyRef, DescriptorId, DescriptorSet, FactoryPartition, InterceptionDecl,
    ParameterClass, PartitionedConstructor, Synthesis,
};
pub use lifetime::{Lifetime, LifetimeSource};
