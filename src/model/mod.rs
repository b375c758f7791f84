//! The type-model boundary.
//!
//! Everything the compiler knows about a program arrives through these
//! types: modules, the capabilities they declare, and the concrete types with
//! their attributes and constructor signatures. The model is plain data so
//! any front end (a source scanner, a build plugin, a hand-written file) can
//! produce it.

pub mod loader;
pub mod type_ref;
pub mod universe;

pub use loader::{load_module, load_modules, parse_module, ModelFormat};
pub use type_ref::{TypeRef, TypeRefParseError};
pub use universe::{
    Accessibility, Attribute, CapabilityModel, ConstructorModel, MethodModel, ModuleModel,
    ParameterModel, TypeModel, TypeSource, TypeUniverse,
};
