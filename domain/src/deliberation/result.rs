//! Aggregated deliberation result

use super::entities::Deliberation;
use super::response::AgentResponse;
use crate::consensus::record::ConsensusRecord;
use crate::evidence::trail::EvidenceTrail;
use serde::{Deserialize, Serialize};

/// A deliberation together with everything recorded for it
///
/// Results returned by the coordinator always carry a consensus record and
/// an evidence trail. Results read back for a `failed` deliberation carry
/// neither.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliberationResult {
    pub deliberation: Deliberation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consensus_record: Option<ConsensusRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence_trail: Option<EvidenceTrail>,
    #[serde(default)]
    pub agent_responses: Vec<AgentResponse>,
}

impl DeliberationResult {
    pub fn successful_responses(&self) -> impl Iterator<Item = &AgentResponse> {
        self.agent_responses.iter().filter(|r| r.is_success())
    }

    /// Whether downstream consumers should route this result to a human
    pub fn needs_review(&self) -> bool {
        self.consensus_record
            .as_ref()
            .is_none_or(|r| !r.disposition.is_consensus())
    }
}
