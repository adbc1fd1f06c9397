//! Consensus engine output

use crate::core::ids::{DeliberationId, ResponderId, ResponseId};
use crate::deliberation::response::AgentResponse;
use crate::deliberation::threshold::ConsensusThreshold;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Name of the voting method recorded on every consensus record
pub const CONSENSUS_METHOD: &str = "weighted_claim_vote";

/// Categorical outcome of the consensus computation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    ConsensusReached,
    NoConsensus,
    InsufficientResponses,
}

impl Disposition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Disposition::ConsensusReached => "consensus_reached",
            Disposition::NoConsensus => "no_consensus",
            Disposition::InsufficientResponses => "insufficient_responses",
        }
    }

    pub fn is_consensus(&self) -> bool {
        matches!(self, Disposition::ConsensusReached)
    }
}

impl std::fmt::Display for Disposition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A group of responses whose claims agree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgreementCluster {
    pub index: usize,
    pub response_ids: Vec<ResponseId>,
    pub responder_ids: Vec<ResponderId>,
    /// Normalized weight share, in [0, 1]
    pub weight: f64,
    pub mean_confidence: f64,
    pub earliest_sequence: u64,
    /// Normalized claims asserted by any member
    pub claims: Vec<String>,
}

impl AgreementCluster {
    pub fn size(&self) -> usize {
        self.response_ids.len()
    }

    pub fn contains(&self, response_id: &ResponseId) -> bool {
        self.response_ids.contains(response_id)
    }
}

/// One per deliberation, created once
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusRecord {
    pub deliberation_id: DeliberationId,
    pub disposition: Disposition,
    pub clusters: Vec<AgreementCluster>,
    /// Index into `clusters` of the winning group
    pub selected_cluster: Option<usize>,
    pub agreement_fraction: f64,
    pub threshold: ConsensusThreshold,
    pub final_response_id: Option<ResponseId>,
    pub final_responder_id: Option<ResponderId>,
    pub final_response: Option<String>,
    /// 0-100
    pub confidence_score: f64,
    /// Successful responders outside the winning group
    pub dissenting_responders: Vec<ResponderId>,
    pub method: String,
    pub created_at: DateTime<Utc>,
}

impl ConsensusRecord {
    /// Record for a round with too few successful responses
    ///
    /// A lone successful response is still surfaced as the final answer,
    /// with zero confidence.
    pub fn insufficient(
        deliberation_id: DeliberationId,
        threshold: ConsensusThreshold,
        lone: Option<&AgentResponse>,
    ) -> Self {
        Self {
            deliberation_id,
            disposition: Disposition::InsufficientResponses,
            clusters: Vec::new(),
            selected_cluster: None,
            agreement_fraction: 0.0,
            threshold,
            final_response_id: lone.map(|r| r.id),
            final_responder_id: lone.map(|r| r.responder_id.clone()),
            final_response: lone.map(|r| r.answer.clone()),
            confidence_score: 0.0,
            dissenting_responders: Vec::new(),
            method: CONSENSUS_METHOD.to_string(),
            created_at: Utc::now(),
        }
    }

    pub fn winning_cluster(&self) -> Option<&AgreementCluster> {
        self.selected_cluster.and_then(|i| self.clusters.get(i))
    }

    /// Every response id this record refers to
    pub fn referenced_responses(&self) -> impl Iterator<Item = &ResponseId> {
        self.clusters
            .iter()
            .flat_map(|c| c.response_ids.iter())
            .chain(self.final_response_id.iter())
    }
}
