//! Diagnostic records collected across a compilation.
//!
//! Every stage always runs to completion and pushes what it finds into a
//! [`Diagnostics`] collector; nothing short-circuits. A compilation fails
//! when at least one collected record has [`Severity::Error`].
//!
//! # Codes
//!
//! Codes are assigned by category:
//! - WM01xx: structural errors (inaccessible types, missing registries,
//!   unresolved dependencies)
//! - WM02xx: graph errors (cycles, ambiguous type arguments)
//! - WM03xx: lifetime findings (captive dependency, lifetime mismatch)
//! - WM04xx: advisory information

use serde::Serialize;
use std::fmt;

/// Structured diagnostic code for documentation and programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DiagnosticCode(&'static str);

impl DiagnosticCode {
    /// A type that would qualify is not visible across its module boundary
    pub const INACCESSIBLE_CROSS_MODULE: DiagnosticCode = DiagnosticCode("WM0101");
    /// A referenced module with components ships no registration table
    pub const MISSING_COMPANION_REGISTRY: DiagnosticCode = DiagnosticCode("WM0102");
    /// No provider for a single dependency
    pub const UNRESOLVED_DEPENDENCY: DiagnosticCode = DiagnosticCode("WM0103");
    /// No provider registered under the requested key
    pub const UNRESOLVED_KEYED_DEPENDENCY: DiagnosticCode = DiagnosticCode("WM0104");
    /// An interceptor identity names no eligible component
    pub const UNRESOLVED_INTERCEPTOR: DiagnosticCode = DiagnosticCode("WM0105");

    /// Construction cycle among direct dependencies
    pub const DEPENDENCY_CYCLE: DiagnosticCode = DiagnosticCode("WM0201");
    /// Type arguments cannot be determined for a generic factory or decorator
    pub const AMBIGUOUS_TYPE_ARGUMENT: DiagnosticCode = DiagnosticCode("WM0202");

    /// Longer-lived component captures a shorter-lived disposable one
    pub const CAPTIVE_DEPENDENCY: DiagnosticCode = DiagnosticCode("WM0301");
    /// Longer-lived component captures a shorter-lived one
    pub const LIFETIME_MISMATCH: DiagnosticCode = DiagnosticCode("WM0302");

    /// A collection dependency has no providers
    pub const EMPTY_COLLECTION: DiagnosticCode = DiagnosticCode("WM0401");
    /// A factory was requested for a type with no runtime parameters
    pub const LOW_VALUE_FACTORY: DiagnosticCode = DiagnosticCode("WM0402");
    /// A cross-cutting attribute has nothing to act on
    pub const ORPHANED_ATTRIBUTE: DiagnosticCode = DiagnosticCode("WM0403");

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        })
    }
}

/// Error taxonomy a diagnostic belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticCategory {
    StructuralError,
    GraphError,
    LifetimeWarning,
    InfoDiagnostic,
}

/// Where a diagnostic points in the type model.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Location {
    pub module: String,
    pub type_name: String,
    /// Constructor parameter or method, when narrower than the type.
    pub member: Option<String>,
}

impl Location {
    pub fn new(module: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            type_name: type_name.into(),
            member: None,
        }
    }

    pub fn with_member(mut self, member: impl Into<String>) -> Self {
        self.member = Some(member.into());
        self
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.module, self.type_name)?;
        if let Some(member) = &self.member {
            write!(f, "({})", member)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: DiagnosticCode,
    pub category: DiagnosticCategory,
    pub message: String,
    pub location: Option<Location>,
    /// Identities involved, in the order the message mentions them.
    pub involved: Vec<String>,
}

impl Diagnostic {
    fn new(
        severity: Severity,
        category: DiagnosticCategory,
        code: DiagnosticCode,
        message: impl Into<String>,
    ) -> Self {
        Self {
            severity,
            code,
            category,
            message: message.into(),
            location: None,
            involved: Vec::new(),
        }
    }

    pub fn structural(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self::new(
            Severity::Error,
            DiagnosticCategory::StructuralError,
            code,
            message,
        )
    }

    pub fn graph(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, DiagnosticCategory::GraphError, code, message)
    }

    /// A lifetime finding; `None` when the configured severity is silent.
    pub fn lifetime(
        severity: ReportSeverity,
        code: DiagnosticCode,
        message: impl Into<String>,
    ) -> Option<Self> {
        let severity = match severity {
            ReportSeverity::Silent => return None,
            ReportSeverity::Warn => Severity::Warning,
            ReportSeverity::Throw => Severity::Error,
        };
        Some(Self::new(
            severity,
            DiagnosticCategory::LifetimeWarning,
            code,
            message,
        ))
    }

    pub fn info(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self::new(
            Severity::Info,
            DiagnosticCategory::InfoDiagnostic,
            code,
            message,
        )
    }

    pub fn at(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    pub fn involving<I, S>(mut self, identities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.involved.extend(identities.into_iter().map(Into::into));
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]: {}", self.severity, self.code, self.message)?;
        if let Some(location) = &self.location {
            write!(f, " at {}", location)?;
        }
        Ok(())
    }
}

/// Reporting behaviour selected by the caller for configurable checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportSeverity {
    Silent,
    #[default]
    Warn,
    Throw,
}

impl std::str::FromStr for ReportSeverity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "silent" => Ok(Self::Silent),
            "warn" => Ok(Self::Warn),
            "throw" => Ok(Self::Throw),
            other => Err(format!("unknown severity `{}`", other)),
        }
    }
}

/// Append-only collector threaded through the stages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Diagnostics {
    records: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        tracing::debug!(code = %diagnostic.code, "{}", diagnostic.message);
        self.records.push(diagnostic);
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.records.extend(other.records);
    }

    pub fn has_errors(&self) -> bool {
        self.records.iter().any(Diagnostic::is_error)
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.records
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    pub fn with_code(&self, code: DiagnosticCode) -> impl Iterator<Item = &Diagnostic> {
        self.records.iter().filter(move |d| d.code == code)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.records
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}
