//! Constructor parameter classification and factory generation.

pub mod classify;
pub mod partition;

pub use classify::{is_runtime_type, ParameterClassifier};
pub use partition::{
    creation_method_name, partition_factories, CreationMethod, FactoryDescriptor, Partitioned,
    RuntimeParameter,
};
