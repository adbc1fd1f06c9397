//! Council parameters: deliberation control.
//!
//! [`CouncilParams`] groups the static parameters that control one
//! deliberation in [`DeliberateUseCase`](crate::use_cases::deliberate::DeliberateUseCase):
//! the default threshold, the dispatch timeouts, the vote shape and the
//! persistence retry policy.

use council_domain::ConsensusThreshold;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Deliberation control parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CouncilParams {
    /// Used when a request does not override the threshold.
    pub consensus_threshold: ConsensusThreshold,
    /// Per-responder call timeout.
    pub agent_timeout: Duration,
    /// Overall fan-out deadline; bounds every per-responder timeout.
    pub deadline: Duration,
    /// Fewest successful responses that can form a vote.
    pub min_participants: usize,
    /// Share of matching claims above which two responses agree.
    pub claim_match_ratio: f64,
    /// Attempts for the final transactional write.
    pub persist_attempts: u32,
    /// Delay before the first retry; doubles on each further retry.
    pub persist_backoff: Duration,
}

impl Default for CouncilParams {
    fn default() -> Self {
        Self {
            consensus_threshold: ConsensusThreshold::default(),
            agent_timeout: Duration::from_secs(10),
            deadline: Duration::from_secs(25),
            min_participants: 2,
            claim_match_ratio: 0.5,
            persist_attempts: 3,
            persist_backoff: Duration::from_millis(100),
        }
    }
}

impl CouncilParams {
    // ==================== Builder Methods ====================

    pub fn with_threshold(mut self, threshold: ConsensusThreshold) -> Self {
        self.consensus_threshold = threshold;
        self
    }

    pub fn with_agent_timeout(mut self, timeout: Duration) -> Self {
        self.agent_timeout = timeout;
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn with_min_participants(mut self, min: usize) -> Self {
        self.min_participants = min;
        self
    }

    pub fn with_claim_match_ratio(mut self, ratio: f64) -> Self {
        self.claim_match_ratio = ratio;
        self
    }

    pub fn with_persist_retry(mut self, attempts: u32, backoff: Duration) -> Self {
        self.persist_attempts = attempts.max(1);
        self.persist_backoff = backoff;
        self
    }

    /// Effective per-responder timeout, never beyond the deadline.
    pub fn effective_agent_timeout(&self) -> Duration {
        self.agent_timeout.min(self.deadline)
    }

    /// Backoff before retry number `retry` (1-based).
    pub fn backoff_for(&self, retry: u32) -> Duration {
        self.persist_backoff
            .saturating_mul(2u32.saturating_pow(retry.saturating_sub(1)))
    }
}
