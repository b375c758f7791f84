//! Dependency graph construction and structural validation.
//!
//! - [`builder`]: resolves dependency-list entries to providers
//! - [`cycles`]: deterministic cycle detection over direct edges
//! - [`lifetime`]: captive-dependency and lifetime-mismatch checks

pub mod builder;
pub mod cycles;
pub mod lifetime;

pub use builder::{DependencyGraph, Edge, Resolution};
pub use cycles::{detect_cycles, report_cycles, Cycle};
pub use lifetime::validate_lifetimes;
