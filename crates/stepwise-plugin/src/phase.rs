//! Per-invocation execution phases
//!
//! ```text
//! Idle -> Validating -> Invalid                 (terminal)
//!                    -> Executing -> Resolved   (terminal)
//!                                 -> Rejected   (terminal)
//! ```
//!
//! An unknown plugin type rejects straight from `Validating`.

use serde::{Deserialize, Serialize};

/// Phase of one step invocation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExecutionPhase {
    /// Not started
    #[default]
    Idle,
    /// Plugin validation running
    Validating,
    /// Validation refused the step
    Invalid,
    /// Executor running or parked on a handoff
    Executing,
    /// Finished with a result
    Resolved,
    /// Finished with an error
    Rejected,
}

impl ExecutionPhase {
    /// Phases reachable from `self`
    #[must_use]
    pub fn allowed_transitions(self) -> &'static [ExecutionPhase] {
        use ExecutionPhase::*;
        match self {
            Idle => &[Validating],
            Validating => &[Invalid, Executing, Rejected],
            Executing => &[Resolved, Rejected],
            Invalid | Resolved | Rejected => &[],
        }
    }

    /// Check if `self -> to` is a legal transition
    #[inline]
    #[must_use]
    pub fn can_transition(self, to: ExecutionPhase) -> bool {
        self.allowed_transitions().contains(&to)
    }

    /// Check if the invocation is over
    #[inline]
    #[must_use]
    pub fn is_terminal(self) -> bool {
        self.allowed_transitions().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::ExecutionPhase::*;

    #[test]
    fn terminal_phases() {
        assert!(Invalid.is_terminal());
        assert!(Resolved.is_terminal());
        assert!(Rejected.is_terminal());
        assert!(!Executing.is_terminal());
    }

    #[test]
    fn invalid_cannot_execute() {
        assert!(Validating.can_transition(Executing));
        assert!(!Invalid.can_transition(Executing));
        assert!(!Idle.can_transition(Executing));
    }
}
