//! Stepwise Plugin
//!
//! Externally registered step handlers and the protocol that runs them:
//! - [`Plugin`]: validates a step and optionally executes it
//! - [`PluginRegistry`]: install records with enable/disable
//! - [`StepExecutor`]: per-step-id executors, preferred over plugins
//! - [`HandoffTable`]: parks an invocation until a mounted component completes it
//! - [`StepProtocol`]: validate, then execute, one [`ExecutionPhase`] at a time
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use stepwise_plugin::{StepOutcome, StepProtocol};
//!
//! let protocol = StepProtocol::new();
//! protocol.mount_component("s1");
//!
//! let waiting = tokio::spawn(async move { protocol.run_step(&step, &context).await });
//! // ... the component finishes its work
//! protocol.handoffs().resolve("s1", StepOutcome::default());
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod error;
pub mod executor;
pub mod handoff;
pub mod phase;
pub mod plugin;
pub mod protocol;
pub mod registry;
pub mod source;

pub use error::PluginError;
pub use executor::{FnExecutor, HandoffExecutor, StepExecutor};
pub use handoff::{HandoffTable, PendingRequest, Ticket};
pub use phase::ExecutionPhase;
pub use plugin::{Plugin, PluginManifest, StepOutcome, Validation};
pub use protocol::StepProtocol;
pub use registry::{InstallRecord, PluginRegistry};
pub use source::{PluginSource, StaticPluginSource};
