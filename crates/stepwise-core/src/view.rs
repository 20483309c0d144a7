//! What the renderer receives for the active triple

use serde_json::Value;
use stepwise_model::Step;
use stepwise_navigation::ActiveTriple;
use stepwise_template::Slot;

/// Everything needed to draw the current step
#[derive(Debug, Clone)]
pub struct RenderView {
    /// Active triple
    pub triple: ActiveTriple,
    /// Current step, when the selected slug exists
    pub step: Option<Step>,
    /// Workspace layout; `None` when no layout is configured
    pub layout: Option<Slot>,
    /// Workspace widgets in configuration order
    pub widgets: Vec<Slot>,
    /// Step template; `None` when no step exists
    pub content: Option<Slot>,
    /// Step template rendered against the context
    pub rendered: Option<Value>,
    /// Interpolated scenario system message
    pub system_message: Option<String>,
    /// Interpolated step assistant message
    pub assistant_message: Option<String>,
    /// Interpolated step initial user message
    pub initial_user_message: Option<String>,
    /// Whether `next` would move
    pub can_next: bool,
    /// Whether `prev` would move
    pub can_prev: bool,
}

impl RenderView {
    /// A step slug is selected but the scenario has no such node
    #[must_use]
    pub fn is_step_missing(&self) -> bool {
        self.triple.has_step() && self.step.is_none()
    }

    /// Placeholder labels of every unresolved slot
    #[must_use]
    pub fn placeholders(&self) -> Vec<String> {
        self.layout
            .iter()
            .chain(self.widgets.iter())
            .chain(self.content.iter())
            .filter_map(Slot::placeholder_label)
            .collect()
    }
}

/// Result of [`crate::Engine::on_submit`]
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitOutcome {
    /// Step that was submitted
    pub step: String,
    /// Plugin result, when the step ran a plugin or executor
    pub result: Option<Value>,
    /// Number of context updates applied from the result
    pub applied_updates: usize,
    /// Navigation after the submission; `None` on the last step
    pub event: Option<stepwise_navigation::NavigationEvent>,
}
