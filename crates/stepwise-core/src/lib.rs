//! Stepwise Core
//!
//! The [`Engine`] facade over the stepwise crates. It loads JSON
//! configuration through a [`ConfigSource`], keeps one context bucket per
//! workspace, resolves layouts and step templates, navigates scenarios and
//! runs plugin steps on submission.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use stepwise_core::{Engine, EngineConfig, FsConfigSource};
//! use stepwise_template::FsLoader;
//!
//! let engine = Engine::new(
//!     EngineConfig::default(),
//!     Arc::new(FsConfigSource::new("config")),
//!     Arc::new(FsLoader::new("templates")),
//! );
//! engine.start().await?;
//!
//! let view = engine.render_view().await?;
//! println!("{}", view.assistant_message.unwrap_or_default());
//! engine.on_submit(serde_json::json!({"email": "ann@example.com"})).await?;
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod config;
pub mod engine;
pub mod error;
pub mod source;
pub mod store;
pub mod view;

pub use config::EngineConfig;
pub use engine::Engine;
pub use error::{EngineError, Result};
pub use source::{ConfigSource, FsConfigSource, MemoryConfigSource};
pub use store::{ItemStore, MemoryItemStore, CONTEXT_COLLECTION};
pub use view::{RenderView, SubmitOutcome};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for embedding the engine
    pub use crate::{
        ConfigSource, Engine, EngineConfig, EngineError, FsConfigSource, ItemStore,
        MemoryConfigSource, MemoryItemStore, RenderView, SubmitOutcome,
    };
    pub use stepwise_navigation::{ActiveTriple, AdjacencyPolicy, NavigationEvent};
    pub use stepwise_template::{Loader, Slot, StaticLoader};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
