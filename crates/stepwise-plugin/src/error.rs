//! Error types for plugin step execution
//!
//! Unlike context and navigation, the plugin protocol surfaces explicit
//! failures. None of them are retried.

/// Plugin protocol error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PluginError {
    /// No enabled plugin handles the step type
    #[error("unknown plugin type: {step_type}")]
    UnknownPluginType {
        /// Step `type`
        step_type: String,
    },

    /// The plugin rejected the step before execution
    #[error("step {step} failed validation: {reason}")]
    StepValidationFailed {
        /// Step slug
        step: String,
        /// Reason reported by the plugin
        reason: String,
    },

    /// Neither a step executor nor a plugin executor is available
    #[error("step {step} does not implement executeStep and no executor is registered")]
    ExecutorMissing {
        /// Step slug
        step: String,
    },

    /// The component awaiting the step went away
    #[error("component for step {step} was unmounted")]
    ComponentUnmounted {
        /// Step slug
        step: String,
    },

    /// A newer invocation for the same step replaced this one
    #[error("invocation of step {step} was superseded")]
    Superseded {
        /// Step slug
        step: String,
    },

    /// Plugin has no install record
    #[error("plugin not installed: {id}")]
    PluginNotInstalled {
        /// Plugin id
        id: String,
    },

    /// Plugin is installed but disabled
    #[error("plugin disabled: {id}")]
    PluginDisabled {
        /// Plugin id
        id: String,
    },

    /// Plugin could not be loaded from its install path
    #[error("failed to load plugin {id}: {reason}")]
    PluginLoadFailed {
        /// Plugin id
        id: String,
        /// Loader message
        reason: String,
    },

    /// The executor reported a failure
    #[error("step {step} failed: {reason}")]
    ExecutionFailed {
        /// Step slug
        step: String,
        /// Failure message
        reason: String,
    },
}

impl PluginError {
    /// Stable error code
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownPluginType { .. } => "unknown_plugin_type",
            Self::StepValidationFailed { .. } => "step_validation_failed",
            Self::ExecutorMissing { .. } => "executor_missing",
            Self::ComponentUnmounted { .. } => "component_unmounted",
            Self::Superseded { .. } => "superseded",
            Self::PluginNotInstalled { .. } => "plugin_not_installed",
            Self::PluginDisabled { .. } => "plugin_disabled",
            Self::PluginLoadFailed { .. } => "plugin_load_failed",
            Self::ExecutionFailed { .. } => "execution_failed",
        }
    }

    /// Check if the error should be shown to the person filling the step
    ///
    /// Validation and execution failures carry a user-facing reason; the rest
    /// are wiring problems or lifecycle noise.
    #[inline]
    #[must_use]
    pub fn is_user_visible(&self) -> bool {
        matches!(
            self,
            Self::StepValidationFailed { .. } | Self::ExecutionFailed { .. }
        )
    }

    /// Check if the invocation was cancelled rather than failed
    #[inline]
    #[must_use]
    pub fn is_cancellation(&self) -> bool {
        matches!(
            self,
            Self::ComponentUnmounted { .. } | Self::Superseded { .. }
        )
    }

    /// Create execution failure
    pub fn execution_failed(step: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ExecutionFailed {
            step: step.into(),
            reason: reason.into(),
        }
    }
}
