//! Plan assembly and artifact emission.
//!
//! Everything here is a pure function of the derived artifacts, so two runs
//! over the same input produce byte-identical tables, sources and
//! fingerprints.

pub mod dot;
pub mod plan;
pub mod sources;

pub use dot::{render_dot, to_petgraph};
pub use plan::{
    build_plan, construction_expression, type_path, OptionsBinding, Registration,
    RegistrationPlan,
};
pub use sources::{generate_sources, GeneratedSource, GENERATED_HEADER};

use crate::errors::Result;
use sha2::{Digest, Sha256};

/// SHA-256 of the canonical JSON form of `plan`, as lowercase hex.
pub fn fingerprint(plan: &RegistrationPlan) -> Result<String> {
    let canonical = serde_json::to_vec(plan)?;
    let mut hasher = Sha256::new();
    hasher.update(&canonical);
    Ok(format!("{:x}", hasher.finalize()))
}
