use crate::core::Lifetime;
use crate::diagnostics::ReportSeverity;
use crate::registry::ConflictPolicy;
use serde::{Deserialize, Serialize};

/// Root configuration structure for wiremap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WiremapConfig {
    /// Lifetime given to components without a lifetime attribute
    pub default_lifetime: Lifetime,

    /// Reporting for a long-lived component capturing a shorter-lived one
    pub lifetime_mismatch: ReportSeverity,

    /// Reporting for a long-lived component capturing a shorter-lived disposable one
    pub captive_dependency: ReportSeverity,

    /// Duplicate-identity handling when module plans are merged
    pub conflict_policy: ConflictPolicy,

    /// Capabilities that mark a component as disposable
    pub disposal_capabilities: Vec<String>,

    /// Capabilities never registered even when implemented
    pub ignored_capabilities: Vec<String>,

    /// Wrappers resolving to every provider of their argument
    pub collection_wrappers: Vec<String>,

    /// Wrappers resolving their argument lazily
    pub deferred_wrappers: Vec<String>,

    pub ignore: IgnoreConfig,
}

impl Default for WiremapConfig {
    fn default() -> Self {
        Self {
            default_lifetime: Lifetime::Singleton,
            lifetime_mismatch: ReportSeverity::Warn,
            captive_dependency: ReportSeverity::Warn,
            conflict_policy: ConflictPolicy::default(),
            disposal_capabilities: vec!["Disposable".into(), "AsyncDisposable".into()],
            ignored_capabilities: Vec::new(),
            collection_wrappers: vec!["Vec".into(), "Collection".into()],
            deferred_wrappers: vec!["Lazy".into(), "Provider".into()],
            ignore: IgnoreConfig::default(),
        }
    }
}

impl WiremapConfig {
    /// Whether a capability name is never registered.
    ///
    /// Disposal capabilities are always skipped: they describe how an
    /// instance is released, not what it can be resolved as.
    pub fn is_ignored_capability(&self, name: &str) -> bool {
        self.ignored_capabilities.iter().any(|c| c == name)
            || self.disposal_capabilities.iter().any(|c| c == name)
    }

    pub fn is_collection_wrapper(&self, name: &str) -> bool {
        self.collection_wrappers.iter().any(|c| c == name)
    }

    pub fn is_deferred_wrapper(&self, name: &str) -> bool {
        self.deferred_wrappers.iter().any(|c| c == name)
    }

    pub fn validate(&self) -> Result<(), String> {
        let overlap: Vec<&String> = self
            .collection_wrappers
            .iter()
            .filter(|w| self.deferred_wrappers.contains(w))
            .collect();
        if !overlap.is_empty() {
            return Err(format!(
                "wrappers cannot be both collection and deferred: {:?}",
                overlap
            ));
        }
        Ok(())
    }
}

/// Glob patterns for module files to skip when walking directories
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IgnoreConfig {
    #[serde(default)]
    pub patterns: Vec<String>,
}
