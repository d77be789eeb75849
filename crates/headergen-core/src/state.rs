//! Run state machine
//!
//! ```text
//! Idle ──► Running ──► Succeeded ──► Idle
//!             │
//!             └──────► Failed ─────► Idle
//! ```

use crate::error::HeadergenError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of an analysis run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    /// No run in flight
    #[default]
    Idle,
    /// Waiting for the analysis service
    Running,
    /// Payload applied to the document
    Succeeded,
    /// Run ended without touching annotations
    Failed,
}

impl RunState {
    /// Every state, for exhaustive checks
    pub const ALL: [Self; 4] = [Self::Idle, Self::Running, Self::Succeeded, Self::Failed];

    /// Whether a run is in flight or still finishing
    #[inline]
    #[must_use]
    pub fn is_busy(self) -> bool {
        !matches!(self, Self::Idle)
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Validate a state transition
///
/// # Errors
/// Returns `HeadergenError::IllegalTransition` for any edge not in the
/// diagram above.
pub fn validate_transition(from: RunState, to: RunState) -> Result<(), HeadergenError> {
    if allowed_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(HeadergenError::IllegalTransition { from, to })
    }
}

/// States reachable from `from` in one step
#[must_use]
pub fn allowed_transitions(from: RunState) -> &'static [RunState] {
    match from {
        RunState::Idle => &[RunState::Running],
        RunState::Running => &[RunState::Succeeded, RunState::Failed],
        RunState::Succeeded | RunState::Failed => &[RunState::Idle],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn happy_path() {
        assert!(validate_transition(RunState::Idle, RunState::Running).is_ok());
        assert!(validate_transition(RunState::Running, RunState::Succeeded).is_ok());
        assert!(validate_transition(RunState::Succeeded, RunState::Idle).is_ok());
        assert!(validate_transition(RunState::Running, RunState::Failed).is_ok());
        assert!(validate_transition(RunState::Failed, RunState::Idle).is_ok());
    }

    #[test]
    fn shortcuts_are_rejected() {
        assert!(validate_transition(RunState::Idle, RunState::Succeeded).is_err());
        assert!(validate_transition(RunState::Running, RunState::Idle).is_err());
        assert!(validate_transition(RunState::Running, RunState::Running).is_err());
        assert!(validate_transition(RunState::Failed, RunState::Running).is_err());
    }

    #[test]
    fn display_and_serde_names_match() {
        for state in RunState::ALL {
            let json = serde_json::to_string(&state).unwrap();
            assert_eq!(json, format!("\"{state}\""));
        }
    }

    fn any_state() -> impl Strategy<Value = RunState> {
        prop::sample::select(RunState::ALL.to_vec())
    }

    proptest! {
        #[test]
        fn validation_agrees_with_allowed_list(from in any_state(), to in any_state()) {
            let ok = validate_transition(from, to).is_ok();
            prop_assert_eq!(ok, allowed_transitions(from).contains(&to));
        }

        #[test]
        fn every_state_returns_to_idle(start in any_state()) {
            let mut state = start;
            for _ in 0..3 {
                if state == RunState::Idle {
                    break;
                }
                state = allowed_transitions(state)[0];
            }
            prop_assert_eq!(state, RunState::Idle);
        }
    }
}
