//! Asynchronous step handoff
//!
//! A step invocation that needs a mounted component to finish parks a
//! single-slot completion in a table keyed by step id. The component later
//! resolves or rejects it by step id.
//!
//! - At most one pending invocation per step id: parking again rejects the
//!   earlier caller with [`PluginError::Superseded`]
//! - Unmount removes the entry and rejects with
//!   [`PluginError::ComponentUnmounted`]; it also marks the step unmounted so
//!   an invocation that has not parked yet rejects instead of waiting
//!   forever
//! - Every entry carries a ULID generation, so a stale ticket can never
//!   remove or complete a newer invocation
//! - Dropping a [`Ticket`] removes its own entry

use crate::error::PluginError;
use crate::plugin::StepOutcome;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::oneshot;
use ulid::Ulid;

type Completion = Result<StepOutcome, PluginError>;

#[derive(Debug)]
struct Pending {
    generation: Ulid,
    sender: oneshot::Sender<Completion>,
    request: Value,
    parked_at: DateTime<Utc>,
}

/// What a mounted component sees of a pending invocation
#[derive(Debug, Clone, PartialEq)]
pub struct PendingRequest {
    /// Step id
    pub step_id: String,
    /// Invocation generation
    pub generation: Ulid,
    /// Context the invocation was started with
    pub context: Value,
    /// When the invocation parked
    pub parked_at: DateTime<Utc>,
}

/// Table of pending step invocations
#[derive(Debug, Clone, Default)]
pub struct HandoffTable {
    entries: Arc<DashMap<String, Pending>>,
    mounted: Arc<DashMap<String, bool>>,
}

impl HandoffTable {
    /// Create empty table
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the component for `step_id` as mounted
    pub fn mount(&self, step_id: &str) {
        self.mounted.insert(step_id.to_string(), true);
        tracing::debug!(step = step_id, "component mounted");
    }

    /// Check if a component is mounted for `step_id`
    #[inline]
    #[must_use]
    pub fn is_mounted(&self, step_id: &str) -> bool {
        self.mounted.get(step_id).is_some_and(|entry| *entry.value())
    }

    /// Park an invocation only while a component is mounted for `step_id`
    ///
    /// # Errors
    /// - `PluginError::ComponentUnmounted` if no component is mounted
    pub fn park_mounted(&self, step_id: &str, context: Value) -> Result<Ticket, PluginError> {
        let unmounted = || PluginError::ComponentUnmounted {
            step: step_id.to_string(),
        };
        if !self.is_mounted(step_id) {
            tracing::info!(step = step_id, "invocation for unmounted component rejected");
            return Err(unmounted());
        }

        let ticket = self.park(step_id, context);
        // `unmount` clears the flag before draining entries, so an unmount
        // that raced the insert is visible here
        if !self.is_mounted(step_id) {
            let generation = ticket.generation;
            if let Some((_, pending)) = self
                .entries
                .remove_if(step_id, |_, pending| pending.generation == generation)
            {
                let _ = pending.sender.send(Err(unmounted()));
            }
        }
        Ok(ticket)
    }

    /// Park an invocation for `step_id`, superseding any pending one
    #[must_use = "dropping the ticket cancels the invocation"]
    pub fn park(&self, step_id: &str, context: Value) -> Ticket {
        let (sender, receiver) = oneshot::channel();
        let generation = Ulid::new();
        let previous = self.entries.insert(
            step_id.to_string(),
            Pending {
                generation,
                sender,
                request: context,
                parked_at: Utc::now(),
            },
        );

        if let Some(previous) = previous {
            tracing::warn!(step = step_id, superseded = %previous.generation, "pending step invocation superseded");
            let _ = previous.sender.send(Err(PluginError::Superseded {
                step: step_id.to_string(),
            }));
        }
        tracing::debug!(step = step_id, %generation, "step invocation parked");

        Ticket {
            step_id: step_id.to_string(),
            generation,
            receiver: Some(receiver),
            entries: Arc::clone(&self.entries),
        }
    }

    /// Pending invocation for `step_id`
    #[must_use]
    pub fn request(&self, step_id: &str) -> Option<PendingRequest> {
        self.entries.get(step_id).map(|pending| PendingRequest {
            step_id: step_id.to_string(),
            generation: pending.generation,
            context: pending.request.clone(),
            parked_at: pending.parked_at,
        })
    }

    /// Complete the pending invocation for `step_id`
    ///
    /// Returns `false` when nothing was pending or the caller is gone.
    pub fn complete(&self, step_id: &str, result: Completion) -> bool {
        match self.entries.remove(step_id) {
            Some((_, pending)) => pending.sender.send(result).is_ok(),
            None => {
                tracing::debug!(step = step_id, "completion for step with nothing pending");
                false
            }
        }
    }

    /// Complete only if the pending invocation is still `generation`
    pub fn complete_generation(&self, step_id: &str, generation: Ulid, result: Completion) -> bool {
        match self
            .entries
            .remove_if(step_id, |_, pending| pending.generation == generation)
        {
            Some((_, pending)) => pending.sender.send(result).is_ok(),
            None => false,
        }
    }

    /// Resolve the pending invocation with an outcome
    pub fn resolve(&self, step_id: &str, outcome: StepOutcome) -> bool {
        self.complete(step_id, Ok(outcome))
    }

    /// Reject the pending invocation with a failure reason
    pub fn reject(&self, step_id: &str, reason: impl Into<String>) -> bool {
        self.complete(step_id, Err(PluginError::execution_failed(step_id, reason)))
    }

    /// Component for `step_id` unmounted: drop the entry and reject the caller
    ///
    /// The step stays marked unmounted until [`HandoffTable::mount`], so
    /// invocations arriving later reject through
    /// [`HandoffTable::park_mounted`]. Returns `true` if a component was
    /// mounted or an invocation was pending.
    pub fn unmount(&self, step_id: &str) -> bool {
        let was_mounted = self.mounted.insert(step_id.to_string(), false) == Some(true);
        let Some((_, pending)) = self.entries.remove(step_id) else {
            if was_mounted {
                tracing::debug!(step = step_id, "component unmounted");
            }
            return was_mounted;
        };
        tracing::info!(step = step_id, generation = %pending.generation, "component unmounted with pending invocation");
        let _ = pending.sender.send(Err(PluginError::ComponentUnmounted {
            step: step_id.to_string(),
        }));
        true
    }

    /// Check if an invocation is pending for `step_id`
    #[inline]
    #[must_use]
    pub fn is_pending(&self, step_id: &str) -> bool {
        self.entries.contains_key(step_id)
    }

    /// Number of pending invocations
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.entries.len()
    }
}

/// Caller side of a parked invocation
#[derive(Debug)]
pub struct Ticket {
    step_id: String,
    generation: Ulid,
    receiver: Option<oneshot::Receiver<Completion>>,
    entries: Arc<DashMap<String, Pending>>,
}

impl Ticket {
    /// Step id
    #[inline]
    #[must_use]
    pub fn step_id(&self) -> &str {
        &self.step_id
    }

    /// Invocation generation
    #[inline]
    #[must_use]
    pub fn generation(&self) -> Ulid {
        self.generation
    }

    /// Wait for the component to complete the invocation
    ///
    /// # Errors
    /// - Whatever the component rejected with
    /// - `PluginError::Superseded` if a newer invocation replaced this one
    /// - `PluginError::ComponentUnmounted` if the component went away
    pub async fn wait(mut self) -> Completion {
        let Some(receiver) = self.receiver.take() else {
            return Err(PluginError::ComponentUnmounted {
                step: self.step_id.clone(),
            });
        };
        match receiver.await {
            Ok(result) => result,
            Err(_) => Err(PluginError::ComponentUnmounted {
                step: self.step_id.clone(),
            }),
        }
    }
}

impl Drop for Ticket {
    fn drop(&mut self) {
        let generation = self.generation;
        if self
            .entries
            .remove_if(&self.step_id, |_, pending| pending.generation == generation)
            .is_some()
        {
            tracing::debug!(step = %self.step_id, %generation, "abandoned step invocation removed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn resolve_delivers_outcome() {
        let table = HandoffTable::new();
        let ticket = table.park("s1", json!({"a": 1}));
        assert_eq!(table.request("s1").unwrap().context, json!({"a": 1}));

        assert!(table.resolve("s1", StepOutcome::with_data(json!("done"))));
        let outcome = ticket.wait().await.unwrap();
        assert_eq!(outcome.data, json!("done"));
        assert_eq!(table.pending_count(), 0);
    }

    #[tokio::test]
    async fn park_supersedes_previous_caller() {
        let table = HandoffTable::new();
        let first = table.park("s1", Value::Null);
        let second = table.park("s1", Value::Null);
        assert_eq!(table.pending_count(), 1);

        assert_eq!(
            first.wait().await,
            Err(PluginError::Superseded {
                step: "s1".to_string()
            })
        );
        assert!(table.is_pending("s1"));

        table.resolve("s1", StepOutcome::default());
        assert!(second.wait().await.is_ok());
    }

    #[tokio::test]
    async fn unmount_rejects_and_clears() {
        let table = HandoffTable::new();
        let ticket = table.park("s1", Value::Null);
        assert!(table.unmount("s1"));
        assert!(!table.unmount("s1"));
        assert_eq!(
            ticket.wait().await,
            Err(PluginError::ComponentUnmounted {
                step: "s1".to_string()
            })
        );
        assert_eq!(table.pending_count(), 0);
    }

    #[tokio::test]
    async fn park_mounted_rejects_after_unmount() {
        let table = HandoffTable::new();
        assert!(matches!(
            table.park_mounted("s1", Value::Null),
            Err(PluginError::ComponentUnmounted { .. })
        ));

        table.mount("s1");
        assert!(table.is_mounted("s1"));
        assert!(table.unmount("s1"));
        assert!(!table.is_mounted("s1"));
        assert!(table.park_mounted("s1", Value::Null).is_err());
        assert_eq!(table.pending_count(), 0);

        table.mount("s1");
        let ticket = table.park_mounted("s1", Value::Null).unwrap();
        assert!(table.resolve("s1", StepOutcome::default()));
        assert!(ticket.wait().await.is_ok());
    }

    #[test]
    fn dropped_ticket_removes_only_its_own_entry() {
        let table = HandoffTable::new();
        let stale = table.park("s1", Value::Null);
        let fresh = table.park("s1", Value::Null);
        drop(stale);
        assert!(table.is_pending("s1"));
        drop(fresh);
        assert!(!table.is_pending("s1"));
    }

    #[tokio::test]
    async fn stale_generation_cannot_complete() {
        let table = HandoffTable::new();
        let stale = table.park("s1", Value::Null);
        let old = stale.generation();
        let ticket = table.park("s1", Value::Null);

        assert!(!table.complete_generation("s1", old, Ok(StepOutcome::default())));
        assert!(table.complete_generation(
            "s1",
            ticket.generation(),
            Ok(StepOutcome::with_data(json!(1)))
        ));
        assert_eq!(ticket.wait().await.unwrap().data, json!(1));
        assert!(stale.wait().await.unwrap_err().is_cancellation());
    }

    #[tokio::test]
    async fn reject_carries_reason() {
        let table = HandoffTable::new();
        let ticket = table.park("s1", Value::Null);
        table.reject("s1", "network down");
        let err = ticket.wait().await.unwrap_err();
        assert!(err.is_user_visible());
        assert!(err.to_string().contains("network down"));
    }
}
