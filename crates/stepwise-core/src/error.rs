//! Error types for the stepwise engine
//!
//! Context and navigation never fail; these errors come from config
//! loading, the plugin protocol and the item store.

use std::path::PathBuf;
use stepwise_model::{ConfigKind, ModelError};
use stepwise_plugin::PluginError;

/// Engine error
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Config document does not exist
    #[error("{kind} config not found: {ids}")]
    ConfigNotFound {
        /// Document kind
        kind: ConfigKind,
        /// Ids joined with `/`
        ids: String,
    },

    /// Config document exists but does not match its shape
    #[error("invalid {kind} config {ids}: {source}")]
    ConfigParse {
        /// Document kind
        kind: ConfigKind,
        /// Ids joined with `/`
        ids: String,
        /// Underlying error
        #[source]
        source: serde_json::Error,
    },

    /// IO error reading config
    #[error("io error at {path}: {source}")]
    Io {
        /// File or directory
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Plugin protocol error
    #[error(transparent)]
    Plugin(#[from] PluginError),

    /// Model invariant violated
    #[error(transparent)]
    Model(#[from] ModelError),

    /// Operation needs a current workspace
    #[error("no workspace selected")]
    NoWorkspace,

    /// Operation needs a current step
    #[error("no step selected")]
    NoStep,

    /// Item store failure
    #[error("item store error: {0}")]
    Store(String),
}

impl EngineError {
    /// Create not-found error
    pub fn config_not_found(kind: ConfigKind, ids: &[&str]) -> Self {
        Self::ConfigNotFound {
            kind,
            ids: ids.join("/"),
        }
    }

    /// Create parse error
    pub fn config_parse(kind: ConfigKind, ids: &[&str], source: serde_json::Error) -> Self {
        Self::ConfigParse {
            kind,
            ids: ids.join("/"),
            source,
        }
    }

    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Stable error code
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigNotFound { .. } => "config_not_found",
            Self::ConfigParse { .. } => "config_parse",
            Self::Io { .. } => "io",
            Self::Plugin(err) => err.code(),
            Self::Model(err) => err.code(),
            Self::NoWorkspace => "no_workspace",
            Self::NoStep => "no_step",
            Self::Store(_) => "store",
        }
    }

    /// Check if the error carries a message meant for the end user
    #[inline]
    #[must_use]
    pub fn is_user_visible(&self) -> bool {
        match self {
            Self::Plugin(err) => err.is_user_visible(),
            _ => false,
        }
    }
}

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;
