//! Deliberation configuration from TOML (`[council]` section)
//!
//! Example configuration:
//!
//! ```toml
//! [council]
//! consensus_threshold = 0.75
//! agent_timeout_ms = 8000
//! deadline_ms = 20000
//! min_participants = 2
//! ```

use council_application::CouncilParams;
use council_domain::ConsensusThreshold;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Deliberation control settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileCouncilConfig {
    /// Default weighted agreement fraction, in (0, 1]
    pub consensus_threshold: f64,
    /// Per-responder call timeout
    pub agent_timeout_ms: u64,
    /// Overall fan-out deadline
    pub deadline_ms: u64,
    /// Fewest successful responses that can form a vote
    pub min_participants: usize,
    /// Share of matching claims above which two responses agree
    pub claim_match_ratio: f64,
    /// Attempts for the final persist step
    pub persist_attempts: u32,
    /// Delay before the first persist retry
    pub persist_backoff_ms: u64,
}

impl Default for FileCouncilConfig {
    fn default() -> Self {
        let params = CouncilParams::default();
        Self {
            consensus_threshold: params.consensus_threshold.value(),
            agent_timeout_ms: params.agent_timeout.as_millis() as u64,
            deadline_ms: params.deadline.as_millis() as u64,
            min_participants: params.min_participants,
            claim_match_ratio: params.claim_match_ratio,
            persist_attempts: params.persist_attempts,
            persist_backoff_ms: params.persist_backoff.as_millis() as u64,
        }
    }
}

impl FileCouncilConfig {
    pub fn parse_threshold(&self) -> Option<ConsensusThreshold> {
        ConsensusThreshold::new(self.consensus_threshold).ok()
    }

    /// Convert to [`CouncilParams`], falling back to the default threshold
    /// when the configured one is out of range
    pub fn to_params(&self) -> CouncilParams {
        CouncilParams::default()
            .with_threshold(self.parse_threshold().unwrap_or_default())
            .with_agent_timeout(Duration::from_millis(self.agent_timeout_ms))
            .with_deadline(Duration::from_millis(self.deadline_ms))
            .with_min_participants(self.min_participants)
            .with_claim_match_ratio(self.claim_match_ratio)
            .with_persist_retry(
                self.persist_attempts,
                Duration::from_millis(self.persist_backoff_ms),
            )
    }
}
