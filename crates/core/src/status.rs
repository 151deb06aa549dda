//! Batch job status enum and state machine.
//!
//! Every status mutation in the store funnels through
//! [`validate_transition`], so the transition table below is the single
//! source of truth for which moves are legal.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Status enum
// ---------------------------------------------------------------------------

/// Lifecycle status of a batch job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    /// Created, no item result recorded yet.
    Pending,
    /// Items are actively being produced.
    Processing,
    /// Scheduling is suspended; already-armed continuations park themselves.
    Paused,
    /// Terminal. Stopped by the owner; no further items are generated.
    Cancelled,
    /// Terminal. Every item has a recorded outcome.
    Completed,
}

impl BatchStatus {
    /// Wire/storage name for the status.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Paused => "paused",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
        }
    }

    /// Terminal statuses admit no further transitions or item work.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Cancelled | Self::Completed)
    }

    /// Active jobs count against the per-owner concurrent batch limit.
    pub fn is_active(self) -> bool {
        !self.is_terminal()
    }
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// State machine
// ---------------------------------------------------------------------------

/// Returns the set of statuses reachable from `from`.
///
/// Terminal states return an empty slice. `Paused -> Completed` is
/// deliberately allowed: the result for an item that was already in flight
/// when the job paused can be the final one, and recording it must be able
/// to close the job out.
pub fn valid_transitions(from: BatchStatus) -> &'static [BatchStatus] {
    use BatchStatus::*;
    match from {
        Pending => &[Processing, Paused, Cancelled],
        Processing => &[Paused, Cancelled, Completed],
        Paused => &[Processing, Cancelled, Completed],
        Cancelled | Completed => &[],
    }
}

/// Check whether a transition from `from` to `to` is valid.
pub fn can_transition(from: BatchStatus, to: BatchStatus) -> bool {
    valid_transitions(from).contains(&to)
}

/// Validate a state transition, returning a conflict error for invalid ones.
pub fn validate_transition(from: BatchStatus, to: BatchStatus) -> Result<(), CoreError> {
    if can_transition(from, to) {
        Ok(())
    } else {
        Err(CoreError::Conflict(format!(
            "Invalid status transition: {from} -> {to}"
        )))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::BatchStatus::*;
    use super::*;

    // -- Valid transitions --

    #[test]
    fn pending_to_processing() {
        assert!(can_transition(Pending, Processing));
    }

    #[test]
    fn pending_to_paused() {
        assert!(can_transition(Pending, Paused));
    }

    #[test]
    fn pending_to_cancelled() {
        assert!(can_transition(Pending, Cancelled));
    }

    #[test]
    fn processing_to_paused() {
        assert!(can_transition(Processing, Paused));
    }

    #[test]
    fn processing_to_cancelled() {
        assert!(can_transition(Processing, Cancelled));
    }

    #[test]
    fn processing_to_completed() {
        assert!(can_transition(Processing, Completed));
    }

    #[test]
    fn paused_to_processing() {
        assert!(can_transition(Paused, Processing));
    }

    #[test]
    fn paused_to_cancelled() {
        assert!(can_transition(Paused, Cancelled));
    }

    #[test]
    fn paused_to_completed() {
        assert!(can_transition(Paused, Completed));
    }

    // -- Terminal states have no outgoing transitions --

    #[test]
    fn cancelled_has_no_transitions() {
        assert!(valid_transitions(Cancelled).is_empty());
    }

    #[test]
    fn completed_has_no_transitions() {
        assert!(valid_transitions(Completed).is_empty());
    }

    // -- Invalid transitions --

    #[test]
    fn pending_to_completed_invalid() {
        assert!(!can_transition(Pending, Completed));
    }

    #[test]
    fn cancelled_to_processing_invalid() {
        assert!(!can_transition(Cancelled, Processing));
    }

    #[test]
    fn completed_to_paused_invalid() {
        assert!(!can_transition(Completed, Paused));
    }

    #[test]
    fn completed_to_cancelled_invalid() {
        assert!(!can_transition(Completed, Cancelled));
    }

    #[test]
    fn self_transition_invalid() {
        assert!(!can_transition(Processing, Processing));
    }

    // -- validate_transition --

    #[test]
    fn validate_transition_ok() {
        assert!(validate_transition(Pending, Processing).is_ok());
    }

    #[test]
    fn validate_transition_err_is_conflict() {
        let err = validate_transition(Completed, Processing).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("completed"));
        assert!(msg.contains("processing"));
        assert!(matches!(err, CoreError::Conflict(_)));
    }

    // -- Classification --

    #[test]
    fn terminal_statuses() {
        assert!(Cancelled.is_terminal());
        assert!(Completed.is_terminal());
        assert!(!Pending.is_terminal());
        assert!(!Processing.is_terminal());
        assert!(!Paused.is_terminal());
    }

    #[test]
    fn active_is_inverse_of_terminal() {
        for status in [Pending, Processing, Paused, Cancelled, Completed] {
            assert_eq!(status.is_active(), !status.is_terminal());
        }
    }

    // -- Serde names --

    #[test]
    fn serializes_snake_case() {
        let json = serde_json::to_string(&Processing).unwrap();
        assert_eq!(json, "\"processing\"");
    }

    #[test]
    fn round_trips_through_as_str() {
        for status in [Pending, Processing, Paused, Cancelled, Completed] {
            let json = format!("\"{}\"", status.as_str());
            let back: BatchStatus = serde_json::from_str(&json).unwrap();
            assert_eq!(back, status);
        }
    }
}
