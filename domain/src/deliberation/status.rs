//! Deliberation lifecycle
//!
//! ```text
//! pending ──▶ in_progress ──▶ consensus_reached ──┐
//!    │             │       ├─▶ no_consensus ───────┼──▶ completed
//!    │             │       └─▶ insufficient_responses
//!    └─────────────┴──▶ failed
//! ```
//!
//! `completed` and `failed` are terminal. `failed` follows a persistence
//! error while starting, or an internal error after dispatch; in the
//! latter case the collected responses are kept.

use crate::consensus::record::Disposition;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliberationStatus {
    Pending,
    InProgress,
    ConsensusReached,
    NoConsensus,
    InsufficientResponses,
    Failed,
    Completed,
}

impl DeliberationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliberationStatus::Pending => "pending",
            DeliberationStatus::InProgress => "in_progress",
            DeliberationStatus::ConsensusReached => "consensus_reached",
            DeliberationStatus::NoConsensus => "no_consensus",
            DeliberationStatus::InsufficientResponses => "insufficient_responses",
            DeliberationStatus::Failed => "failed",
            DeliberationStatus::Completed => "completed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DeliberationStatus::Completed | DeliberationStatus::Failed
        )
    }

    /// Whether the state machine allows moving from `self` to `next`
    pub fn can_transition_to(&self, next: DeliberationStatus) -> bool {
        use DeliberationStatus::*;

        matches!(
            (self, next),
            (Pending, InProgress)
                | (Pending, Failed)
                | (InProgress, ConsensusReached)
                | (InProgress, NoConsensus)
                | (InProgress, InsufficientResponses)
                | (InProgress, Failed)
                | (ConsensusReached, Completed)
                | (NoConsensus, Completed)
                | (InsufficientResponses, Completed)
        )
    }
}

impl From<Disposition> for DeliberationStatus {
    fn from(disposition: Disposition) -> Self {
        match disposition {
            Disposition::ConsensusReached => DeliberationStatus::ConsensusReached,
            Disposition::NoConsensus => DeliberationStatus::NoConsensus,
            Disposition::InsufficientResponses => DeliberationStatus::InsufficientResponses,
        }
    }
}

impl std::fmt::Display for DeliberationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DeliberationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(DeliberationStatus::Pending),
            "in_progress" => Ok(DeliberationStatus::InProgress),
            "consensus_reached" => Ok(DeliberationStatus::ConsensusReached),
            "no_consensus" => Ok(DeliberationStatus::NoConsensus),
            "insufficient_responses" => Ok(DeliberationStatus::InsufficientResponses),
            "failed" => Ok(DeliberationStatus::Failed),
            "completed" => Ok(DeliberationStatus::Completed),
            other => Err(format!("Unknown deliberation status: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use DeliberationStatus::*;

    #[test]
    fn test_happy_path_transitions() {
        assert!(Pending.can_transition_to(InProgress));
        assert!(InProgress.can_transition_to(ConsensusReached));
        assert!(ConsensusReached.can_transition_to(Completed));
        assert!(InProgress.can_transition_to(InsufficientResponses));
        assert!(NoConsensus.can_transition_to(Completed));
    }

    #[test]
    fn test_failed_only_before_outcome() {
        assert!(Pending.can_transition_to(Failed));
        assert!(InProgress.can_transition_to(Failed));
        assert!(!ConsensusReached.can_transition_to(Failed));
        assert!(!NoConsensus.can_transition_to(Failed));
    }

    #[test]
    fn test_terminal_states_are_frozen() {
        for next in [
            Pending,
            InProgress,
            ConsensusReached,
            NoConsensus,
            InsufficientResponses,
            Failed,
            Completed,
        ] {
            assert!(!Completed.can_transition_to(next));
            assert!(!Failed.can_transition_to(next));
        }
        assert!(Completed.is_terminal());
        assert!(Failed.is_terminal());
        assert!(!NoConsensus.is_terminal());
    }

    #[test]
    fn test_cannot_skip_in_progress() {
        assert!(!Pending.can_transition_to(ConsensusReached));
        assert!(!Pending.can_transition_to(Completed));
        assert!(!InProgress.can_transition_to(Completed));
    }

    #[test]
    fn test_parse_round_trip() {
        for status in [Pending, InProgress, NoConsensus, InsufficientResponses, Completed] {
            assert_eq!(status.as_str().parse::<DeliberationStatus>(), Ok(status));
        }
        assert!("bogus".parse::<DeliberationStatus>().is_err());
    }

    #[test]
    fn test_serde_snake_case() {
        assert_eq!(
            serde_json::to_string(&InsufficientResponses).unwrap(),
            "\"insufficient_responses\""
        );
    }
}
