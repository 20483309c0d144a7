//! Template resolution for stepwise flows
//!
//! Layouts, widgets and step templates are named by a [`TemplateRef`]
//! (`namespace/category/identifier`). A [`TemplateResolver`] maps each
//! reference to a loaded [`Template`] exactly once per session, caching
//! failures as well as successes.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use stepwise_template::{FsLoader, TemplateResolver};
//! use stepwise_model::TemplateRef;
//!
//! let resolver = TemplateResolver::new(Arc::new(FsLoader::new("templates")));
//! let intro = resolver.resolve(&TemplateRef::step("default", "intro.json")).await;
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod error;
pub mod loader;
pub mod resolver;
pub mod slot;
pub mod template;

pub use error::LoadError;
pub use loader::{ChainLoader, FsLoader, Loader, StaticLoader};
pub use resolver::{Resolution, ResolverStats, TemplateResolver};
pub use slot::Slot;
pub use template::Template;

pub use stepwise_model::{TemplateCategory, TemplateRef};
