//! Evidence trail value types

use crate::core::ids::{DeliberationId, ResponderId, ResponseId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One response asserting an equivalent claim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportingEvidence {
    pub response_id: ResponseId,
    pub responder_id: ResponderId,
    /// The claim as that responder phrased it
    pub claim: String,
    pub sources: Vec<String>,
}

/// Provenance of one claim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimProvenance {
    pub claim: String,
    pub normalized: String,
    pub supporters: Vec<SupportingEvidence>,
    /// Backed by at least one response besides the final one
    pub corroborated: bool,
    /// False for dissenting claims kept for audit
    pub in_final_response: bool,
}

impl ClaimProvenance {
    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.supporters
            .iter()
            .flat_map(|s| s.sources.iter().map(String::as_str))
    }
}

/// A deliberation's provenance map, created once
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceTrail {
    pub deliberation_id: DeliberationId,
    pub final_response_id: Option<ResponseId>,
    pub claims: Vec<ClaimProvenance>,
    pub created_at: DateTime<Utc>,
}

impl EvidenceTrail {
    pub fn empty(deliberation_id: DeliberationId) -> Self {
        Self {
            deliberation_id,
            final_response_id: None,
            claims: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn final_claims(&self) -> impl Iterator<Item = &ClaimProvenance> {
        self.claims.iter().filter(|c| c.in_final_response)
    }

    pub fn uncorroborated(&self) -> impl Iterator<Item = &ClaimProvenance> {
        self.claims.iter().filter(|c| !c.corroborated)
    }

    pub fn response_ids(&self) -> HashSet<ResponseId> {
        self.claims
            .iter()
            .flat_map(|c| c.supporters.iter().map(|s| s.response_id))
            .chain(self.final_response_id)
            .collect()
    }

    /// Whether every referenced response is in `allowed`
    pub fn references_only(&self, allowed: &HashSet<ResponseId>) -> bool {
        self.response_ids().is_subset(allowed)
    }
}
