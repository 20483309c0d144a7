//! Navigation events
//!
//! Every effective transition yields one event the caller can forward to a
//! router or a log. No-ops yield nothing.

use serde::{Deserialize, Serialize};

/// Outcome of an effective transition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum NavigationEvent {
    /// A workspace became current; scenario and step were cleared
    WorkspaceEntered {
        /// Workspace slug
        workspace: String,
    },
    /// A scenario became current
    ScenarioEntered {
        /// Workspace slug
        workspace: String,
        /// Scenario slug
        scenario: String,
        /// Step landed on, if the scenario has nodes
        step: Option<String>,
    },
    /// A step became current
    StepEntered {
        /// Scenario slug
        scenario: String,
        /// New step slug
        step: String,
        /// Step left, if any
        from: Option<String>,
    },
}

impl NavigationEvent {
    /// Step the event lands on, if any
    #[must_use]
    pub fn step(&self) -> Option<&str> {
        match self {
            Self::WorkspaceEntered { .. } => None,
            Self::ScenarioEntered { step, .. } => step.as_deref(),
            Self::StepEntered { step, .. } => Some(step),
        }
    }
}
