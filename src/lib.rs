//! Compile-time dependency-injection graph compiler.
//!
//! Given a type universe (modules, capabilities, concrete types and their
//! attributes) wiremap extracts component descriptors, builds and checks the
//! dependency graph, resolves decorators, synthesizes interceptor proxies and
//! factories, and emits a deterministic registration plan plus generated
//! source fragments for a runtime container.

pub mod cli;
pub mod commands;
pub mod config;
pub mod core;
pub mod decorators;
pub mod diagnostics;
pub mod emit;
pub mod errors;
pub mod extraction;
pub mod factory;
pub mod graph;
pub mod intercept;
pub mod io;
pub mod model;
pub mod pipeline;
pub mod registry;

// Re-export commonly used types
pub use crate::config::WiremapConfig;
pub use crate::core::{ComponentDescriptor, ComponentShape, DescriptorSet, Lifetime};
pub use crate::diagnostics::{Diagnostic, DiagnosticCode, Diagnostics, ReportSeverity, Severity};
pub use crate::emit::{RegistrationPlan, GENERATED_HEADER};
pub use crate::errors::{Result, WiremapError};
pub use crate::io::output::{create_writer, OutputFormat, OutputWriter};
pub use crate::model::{ModuleModel, TypeRef, TypeSource, TypeUniverse};
pub use crate::pipeline::{compile, compile_modules, CompilationOutput, CompilationReport};
pub use crate::registry::{AggregationError, ConflictPolicy, PlanRegistry};
