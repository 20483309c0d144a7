//! Stepwise Model
//!
//! The data model every other stepwise crate speaks:
//! - [`Workspace`]: top-level container owning scenarios and the seed context
//! - [`Scenario`]: an ordered sequence of steps with order invariants
//! - [`Step`]: one unit of a scenario, bound to a template reference
//! - [`TemplateRef`]: a logical `(namespace, category, identifier)` triple
//! - Config file shapes (`app.json`, `workspaces/*.json`, `scenarios/*/*.json`)
//!
//! # Example
//!
//! ```rust,ignore
//! use stepwise_model::{Scenario, Step};
//!
//! let mut scenario = Scenario::new("onboarding");
//! scenario.insert_node(Step::new("intro", 1, "intro.json"))?;
//! scenario.insert_node(Step::new("profile", 2, "form.json"))?;
//!
//! assert_eq!(scenario.first_node().map(|s| s.slug.as_str()), Some("intro"));
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod config;
pub mod error;
pub mod scenario;
pub mod step;
pub mod template_ref;
pub mod workspace;

pub use config::{AppConfig, ConfigKind, ScenarioConfig, WorkspaceConfig};
pub use error::ModelError;
pub use scenario::Scenario;
pub use step::Step;
pub use template_ref::{TemplateCategory, TemplateRef};
pub use workspace::{TemplateSettings, Workspace};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the stepwise model
    pub use crate::{
        AppConfig, ConfigKind, ModelError, Scenario, ScenarioConfig, Step, TemplateCategory,
        TemplateRef, TemplateSettings, Workspace, WorkspaceConfig,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
