//! Type model extraction: from the type universe to component descriptors.

pub mod capabilities;
pub mod constructor;
pub mod extractor;

pub use capabilities::{expand_capabilities, factory_capability_name, CapabilityUniverse};
pub use constructor::{compare_constructors, select_best_constructor};
pub use extractor::{Extraction, Extractor, OpenDecorator};
