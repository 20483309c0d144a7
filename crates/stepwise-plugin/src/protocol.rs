//! Step execution protocol
//!
//! Ties the registry, step executors and the handoff table together and
//! walks each invocation through [`ExecutionPhase`]s.

use crate::error::PluginError;
use crate::executor::{HandoffExecutor, StepExecutor};
use crate::handoff::HandoffTable;
use crate::phase::ExecutionPhase;
use crate::plugin::{Plugin, StepOutcome, Validation};
use crate::registry::PluginRegistry;
use dashmap::DashMap;
use serde_json::Value;
use std::sync::Arc;
use stepwise_model::Step;

/// Plugin step-execution protocol
#[derive(Default)]
pub struct StepProtocol {
    registry: PluginRegistry,
    executors: DashMap<String, Arc<dyn StepExecutor>>,
    handoffs: HandoffTable,
    phases: DashMap<String, ExecutionPhase>,
}

impl std::fmt::Debug for StepProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepProtocol")
            .field("registry", &self.registry)
            .field("executors", &self.executors.len())
            .field("pending", &self.handoffs.pending_count())
            .finish()
    }
}

impl StepProtocol {
    /// Create protocol with an empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Plugin registry
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    /// Handoff table shared with mounted components
    #[inline]
    #[must_use]
    pub fn handoffs(&self) -> &HandoffTable {
        &self.handoffs
    }

    /// Register an in-process plugin
    pub fn register_plugin(&self, plugin: Arc<dyn Plugin>) {
        self.registry.register(plugin);
    }

    /// Register an executor for one step id, replacing any previous one
    pub fn register_step_executor(&self, step_id: &str, executor: Arc<dyn StepExecutor>) {
        if self
            .executors
            .insert(step_id.to_string(), executor)
            .is_some()
        {
            tracing::debug!(step = step_id, "step executor replaced");
        }
    }

    /// Remove the executor for a step id
    pub fn unregister_step_executor(&self, step_id: &str) -> bool {
        self.executors.remove(step_id).is_some()
    }

    /// Check if an executor is registered for a step id
    #[inline]
    #[must_use]
    pub fn has_executor(&self, step_id: &str) -> bool {
        self.executors.contains_key(step_id)
    }

    /// Mount a component for `step_id`: invocations park until it completes
    /// them through [`StepProtocol::handoffs`]
    pub fn mount_component(&self, step_id: &str) {
        self.handoffs.mount(step_id);
        self.register_step_executor(
            step_id,
            Arc::new(HandoffExecutor::new(self.handoffs.clone())),
        );
    }

    /// Unmount the component for `step_id`
    ///
    /// Any pending invocation rejects with `ComponentUnmounted`. The handoff
    /// executor stays registered, so invocations already in flight or
    /// started later reject the same way until the component mounts again.
    pub fn unmount_component(&self, step_id: &str) -> bool {
        self.handoffs.unmount(step_id)
    }

    /// Validate a step against the plugin for its type
    ///
    /// Steps without a `type` have no plugin and are always valid.
    ///
    /// # Errors
    /// - `PluginError::UnknownPluginType` / `PluginError::PluginDisabled` if
    ///   no enabled plugin handles the type
    pub fn validate_step(&self, step: &Step, context: &Value) -> Result<Validation, PluginError> {
        match step.step_type.as_deref() {
            Some(step_type) => {
                let plugin = self.registry.plugin_for(step_type)?;
                Ok(plugin.validate(step, context))
            }
            None => Ok(Validation::valid()),
        }
    }

    /// Execute a step without validating it
    ///
    /// The executor registered for the step id is preferred; otherwise the
    /// plugin for the step type runs its own `execute_step`.
    ///
    /// # Errors
    /// - `PluginError::UnknownPluginType` / `PluginError::PluginDisabled` if
    ///   the step's type has no enabled plugin
    /// - `PluginError::ExecutorMissing` if neither is available
    /// - Any error the executor returns
    pub async fn execute_step(&self, step: &Step, context: &Value) -> Result<StepOutcome, PluginError> {
        let executor = self
            .executors
            .get(&step.slug)
            .map(|entry| Arc::clone(entry.value()));
        if let Some(executor) = executor {
            return executor.execute(step, context).await;
        }

        let plugin = match step.step_type.as_deref() {
            Some(step_type) => Some(self.registry.plugin_for(step_type)?),
            None => None,
        };
        match plugin {
            Some(plugin) => plugin.execute_step(step, context).await,
            None => Err(PluginError::ExecutorMissing {
                step: step.slug.clone(),
            }),
        }
    }

    /// Validate, then execute, tracking the invocation phase
    ///
    /// # Errors
    /// - `PluginError::StepValidationFailed` with the plugin's reason
    /// - Everything [`StepProtocol::validate_step`] and
    ///   [`StepProtocol::execute_step`] return
    pub async fn run_step(&self, step: &Step, context: &Value) -> Result<StepOutcome, PluginError> {
        let step_id = step.slug.as_str();
        self.phases.insert(step_id.to_string(), ExecutionPhase::Idle);
        self.advance(step_id, ExecutionPhase::Validating);

        let validation = match self.validate_step(step, context) {
            Ok(validation) => validation,
            Err(err) => {
                self.advance(step_id, ExecutionPhase::Rejected);
                return Err(err);
            }
        };
        if !validation.valid {
            self.advance(step_id, ExecutionPhase::Invalid);
            let reason = validation
                .error
                .unwrap_or_else(|| "validation failed".to_string());
            tracing::info!(step = step_id, %reason, "step rejected by validation");
            return Err(PluginError::StepValidationFailed {
                step: step_id.to_string(),
                reason,
            });
        }

        self.advance(step_id, ExecutionPhase::Executing);
        match self.execute_step(step, context).await {
            Ok(outcome) => {
                self.advance(step_id, ExecutionPhase::Resolved);
                Ok(outcome)
            }
            Err(err) => {
                self.advance(step_id, ExecutionPhase::Rejected);
                tracing::warn!(step = step_id, code = err.code(), error = %err, "step execution failed");
                Err(err)
            }
        }
    }

    /// Phase of the latest invocation of a step
    #[must_use]
    pub fn phase(&self, step_id: &str) -> ExecutionPhase {
        self.phases
            .get(step_id)
            .map(|phase| *phase.value())
            .unwrap_or_default()
    }

    fn advance(&self, step_id: &str, to: ExecutionPhase) {
        if let Some(mut phase) = self.phases.get_mut(step_id) {
            if !phase.can_transition(to) {
                tracing::warn!(step = step_id, from = ?*phase, ?to, "illegal execution phase transition");
            }
            *phase = to;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::FnExecutor;
    use crate::plugin::PluginManifest;
    use serde_json::json;

    /// Requires `context.email`, echoes it back
    struct EmailPlugin(PluginManifest);

    #[async_trait::async_trait]
    impl Plugin for EmailPlugin {
        fn manifest(&self) -> &PluginManifest {
            &self.0
        }

        fn validate(&self, _step: &Step, context: &Value) -> Validation {
            if context.get("email").is_some() {
                Validation::valid()
            } else {
                Validation::invalid("email is required")
            }
        }

        async fn execute_step(&self, _step: &Step, context: &Value) -> Result<StepOutcome, PluginError> {
            Ok(StepOutcome::with_data(context["email"].clone())
                .with_update("contact.email", context["email"].clone()))
        }
    }

    /// Validates everything, has no executor
    struct Passive(PluginManifest);

    impl Plugin for Passive {
        fn manifest(&self) -> &PluginManifest {
            &self.0
        }

        fn validate(&self, _step: &Step, _context: &Value) -> Validation {
            Validation::valid()
        }
    }

    fn protocol() -> StepProtocol {
        let protocol = StepProtocol::new();
        protocol.register_plugin(Arc::new(EmailPlugin(PluginManifest::new("email", "1.0.0"))));
        protocol.register_plugin(Arc::new(Passive(PluginManifest::new("passive", "1.0.0"))));
        protocol
    }

    #[tokio::test]
    async fn plugin_executor_runs_after_validation() {
        let protocol = protocol();
        let step = Step::new("contact", 1, "contact.json").with_type("email");
        let outcome = protocol
            .run_step(&step, &json!({"email": "ann@example.com"}))
            .await
            .unwrap();
        assert_eq!(outcome.data, json!("ann@example.com"));
        assert_eq!(protocol.phase("contact"), ExecutionPhase::Resolved);
    }

    #[tokio::test]
    async fn invalid_step_never_executes() {
        let protocol = protocol();
        let step = Step::new("contact", 1, "contact.json").with_type("email");
        let err = protocol.run_step(&step, &json!({})).await.unwrap_err();
        assert_eq!(
            err,
            PluginError::StepValidationFailed {
                step: "contact".to_string(),
                reason: "email is required".to_string(),
            }
        );
        assert_eq!(protocol.phase("contact"), ExecutionPhase::Invalid);
    }

    #[tokio::test]
    async fn unknown_type_is_not_a_validation_failure() {
        let protocol = protocol();
        let step = Step::new("x", 1, "x.json").with_type("nope");
        let err = protocol.run_step(&step, &json!({})).await.unwrap_err();
        assert_eq!(err.code(), "unknown_plugin_type");
        assert_eq!(protocol.phase("x"), ExecutionPhase::Rejected);
    }

    #[tokio::test]
    async fn missing_executor_is_reported() {
        let protocol = protocol();
        let step = Step::new("p", 1, "p.json").with_type("passive");
        let err = protocol.run_step(&step, &json!({})).await.unwrap_err();
        assert!(matches!(err, PluginError::ExecutorMissing { .. }));

        let untyped = Step::new("plain", 1, "plain.json");
        assert!(matches!(
            protocol.execute_step(&untyped, &json!({})).await,
            Err(PluginError::ExecutorMissing { .. })
        ));
    }

    #[tokio::test]
    async fn step_executor_takes_precedence() {
        let protocol = protocol();
        protocol.register_step_executor(
            "contact",
            Arc::new(FnExecutor::new(|_step: Step, _ctx: Value| async {
                Ok(StepOutcome::with_data(json!("from executor")))
            })),
        );
        let step = Step::new("contact", 1, "contact.json").with_type("email");
        let outcome = protocol
            .run_step(&step, &json!({"email": "ann@example.com"}))
            .await
            .unwrap();
        assert_eq!(outcome.data, json!("from executor"));
    }

    #[tokio::test]
    async fn disabled_plugin_is_excluded() {
        let protocol = protocol();
        protocol.registry().disable("email").unwrap();
        let step = Step::new("contact", 1, "contact.json").with_type("email");
        let err = protocol
            .run_step(&step, &json!({"email": "a"}))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "plugin_disabled");
    }

    #[tokio::test]
    async fn direct_execution_reports_registry_errors() {
        let protocol = protocol();
        let unknown = Step::new("x", 1, "x.json").with_type("nope");
        assert_eq!(
            protocol.execute_step(&unknown, &json!({})).await.unwrap_err().code(),
            "unknown_plugin_type"
        );

        protocol.registry().disable("email").unwrap();
        let disabled = Step::new("contact", 1, "contact.json").with_type("email");
        assert_eq!(
            protocol.execute_step(&disabled, &json!({})).await.unwrap_err().code(),
            "plugin_disabled"
        );
    }
}
