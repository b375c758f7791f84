//! Error types for wiremap operations.
//!
//! Problems found *in* a component model are never errors here: they are
//! [`Diagnostic`](crate::diagnostics::Diagnostic)s collected across every
//! stage of a compilation. `WiremapError` covers the failures around the
//! analysis: reading inputs, parsing module files, loading configuration and
//! merging module plans at start-up.

use crate::registry::AggregationError;
use std::path::PathBuf;
use thiserror::Error;

/// Convenience alias used throughout the library.
pub type Result<T, E = WiremapError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum WiremapError {
    /// File system I/O errors (read, write, permissions, etc.)
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A module file could not be parsed into a type model.
    #[error("failed to parse module file {path}: {message}")]
    ModelParse { path: PathBuf, message: String },

    /// A module file extension we do not know how to read.
    #[error("unsupported module file format: {path}")]
    UnsupportedFormat { path: PathBuf },

    /// Configuration file issues.
    #[error("configuration error{}: {message}", path.as_ref().map(|p| format!(" in {}", p.display())).unwrap_or_default())]
    Config {
        message: String,
        path: Option<PathBuf>,
    },

    /// Two module files declare the same module name.
    #[error("module `{module}` is declared by both {first} and {second}")]
    DuplicateModule {
        module: String,
        first: PathBuf,
        second: PathBuf,
    },

    /// Merging module plans into the runtime table failed.
    #[error(transparent)]
    Aggregation(#[from] AggregationError),

    /// Output serialization failed.
    #[error("failed to serialize output: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl WiremapError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn model_parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::ModelParse {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            path: None,
        }
    }

    pub fn config_with_path(message: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::Config {
            message: message.into(),
            path: Some(path.into()),
        }
    }

    /// Whether the user can fix this by editing their inputs.
    pub fn is_user_fixable(&self) -> bool {
        matches!(
            self,
            Self::ModelParse { .. }
                | Self::UnsupportedFormat { .. }
                | Self::Config { .. }
                | Self::DuplicateModule { .. }
                | Self::Aggregation(_)
        )
    }
}
