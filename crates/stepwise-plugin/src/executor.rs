//! Step-specific executors
//!
//! An executor registered for a step id takes precedence over the plugin's
//! own `execute_step`.

use crate::error::PluginError;
use crate::handoff::HandoffTable;
use crate::plugin::StepOutcome;
use serde_json::Value;
use std::future::Future;
use stepwise_model::Step;

/// Executes one step
#[async_trait::async_trait]
pub trait StepExecutor: Send + Sync {
    /// Run the step against a context snapshot
    async fn execute(&self, step: &Step, context: &Value) -> Result<StepOutcome, PluginError>;
}

/// Executor backed by an async closure
pub struct FnExecutor<F> {
    f: F,
}

impl<F> FnExecutor<F> {
    /// Wrap a closure taking owned step and context
    #[inline]
    #[must_use]
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> std::fmt::Debug for FnExecutor<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("FnExecutor")
    }
}

#[async_trait::async_trait]
impl<F, Fut> StepExecutor for FnExecutor<F>
where
    F: Fn(Step, Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<StepOutcome, PluginError>> + Send + 'static,
{
    async fn execute(&self, step: &Step, context: &Value) -> Result<StepOutcome, PluginError> {
        (self.f)(step.clone(), context.clone()).await
    }
}

/// Executor that parks the invocation until the mounted component for the
/// step completes it through the [`HandoffTable`]
#[derive(Debug, Clone)]
pub struct HandoffExecutor {
    table: HandoffTable,
}

impl HandoffExecutor {
    /// Create executor over a handoff table
    #[inline]
    #[must_use]
    pub fn new(table: HandoffTable) -> Self {
        Self { table }
    }
}

#[async_trait::async_trait]
impl StepExecutor for HandoffExecutor {
    async fn execute(&self, step: &Step, context: &Value) -> Result<StepOutcome, PluginError> {
        self.table
            .park_mounted(&step.slug, context.clone())?
            .wait()
            .await
    }
}
