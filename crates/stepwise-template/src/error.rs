//! Error types for template loading
//!
//! Loader errors never escape the resolver; they are logged, counted and
//! turned into a cached `None`.

use std::path::PathBuf;
use stepwise_model::TemplateRef;

/// Errors raised by a [`crate::Loader`]
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// No implementation is registered or present for the reference
    #[error("template not found: {0}")]
    NotFound(TemplateRef),

    /// IO error while reading the template
    #[error("io error reading {path}: {source}")]
    Io {
        /// Template file
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Template document is not valid JSON
    #[error("invalid template document {path}: {source}")]
    Parse {
        /// Template file
        path: PathBuf,
        /// Underlying error
        #[source]
        source: serde_json::Error,
    },
}

impl LoadError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Check if the error means the template simply does not exist
    #[inline]
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::NotFound(_) => true,
            Self::Io { source, .. } => source.kind() == std::io::ErrorKind::NotFound,
            Self::Parse { .. } => false,
        }
    }
}
