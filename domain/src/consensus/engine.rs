//! Weighted claim vote
//!
//! Reduces the successful responses of one deliberation into a
//! [`ConsensusRecord`]:
//!
//! 1. Normalize each response's claims.
//! 2. Cluster responses whose claim sets agree; an unmatched response is a
//!    singleton group.
//! 3. Weight each response by its trust weight over the total.
//! 4. The heaviest group is the candidate; its share is the agreement
//!    fraction. Ties go to higher mean confidence, then to the group that
//!    responded first.
//! 5. At or above the threshold the group's most confident member is the
//!    final answer.
//! 6. Below it, the most confident response overall is returned with its
//!    confidence scaled down by the agreement fraction.
//!
//! Responses are ordered by receipt sequence before anything else happens,
//! so the result never depends on the order of the input slice.

use super::claims::{ClaimSet, DEFAULT_CLAIM_MATCH_RATIO};
use super::cluster::cluster_claim_sets;
use super::record::{AgreementCluster, ConsensusRecord, Disposition, CONSENSUS_METHOD};
use super::weights::TrustWeights;
use crate::core::error::DomainError;
use crate::core::ids::DeliberationId;
use crate::deliberation::response::AgentResponse;
use crate::deliberation::threshold::ConsensusThreshold;
use chrono::Utc;
use std::cmp::Ordering;

/// Fewest successful responses that can form a vote
pub const DEFAULT_MIN_PARTICIPANTS: usize = 2;

const WEIGHT_EPSILON: f64 = 1e-9;

/// Consensus engine (pure, no I/O)
#[derive(Debug, Clone)]
pub struct ConsensusEngine {
    claim_match_ratio: f64,
    min_participants: usize,
    weights: TrustWeights,
}

impl Default for ConsensusEngine {
    fn default() -> Self {
        Self {
            claim_match_ratio: DEFAULT_CLAIM_MATCH_RATIO,
            min_participants: DEFAULT_MIN_PARTICIPANTS,
            weights: TrustWeights::default(),
        }
    }
}

struct Candidate<'a> {
    members: Vec<&'a AgentResponse>,
    weight: f64,
    mean_confidence: f64,
    earliest_sequence: u64,
}

impl ConsensusEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_claim_match_ratio(mut self, ratio: f64) -> Self {
        self.claim_match_ratio = ratio;
        self
    }

    /// Values below 1 are raised to 1
    pub fn with_min_participants(mut self, min: usize) -> Self {
        self.min_participants = min.max(1);
        self
    }

    pub fn with_weights(mut self, weights: TrustWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn min_participants(&self) -> usize {
        self.min_participants
    }

    /// Evaluate a deliberation's responses
    ///
    /// Failed responses are ignored for voting. Every response must belong
    /// to `deliberation_id`.
    pub fn evaluate(
        &self,
        deliberation_id: DeliberationId,
        threshold: ConsensusThreshold,
        responses: &[AgentResponse],
    ) -> Result<ConsensusRecord, DomainError> {
        if let Some(foreign) = responses
            .iter()
            .find(|r| r.deliberation_id != deliberation_id)
        {
            return Err(DomainError::ForeignResponse {
                response: foreign.id.to_string(),
                owner: foreign.deliberation_id.to_string(),
                expected: deliberation_id.to_string(),
            });
        }

        let mut voters: Vec<&AgentResponse> = responses.iter().filter(|r| r.is_success()).collect();
        voters.sort_by(|a, b| {
            a.sequence
                .cmp(&b.sequence)
                .then_with(|| a.responder_id.cmp(&b.responder_id))
                .then_with(|| a.id.cmp(&b.id))
        });

        if voters.len() < self.min_participants {
            let lone = (voters.len() == 1).then(|| voters[0]);
            return Ok(ConsensusRecord::insufficient(
                deliberation_id,
                threshold,
                lone,
            ));
        }

        let claim_sets: Vec<ClaimSet> = voters
            .iter()
            .map(|r| ClaimSet::from_claims(r.effective_claims()))
            .collect();
        let groups = cluster_claim_sets(&claim_sets, self.claim_match_ratio);

        let raw = self.weights.effective(voters.iter().map(|r| &r.responder_id));
        let total: f64 = raw.iter().sum();

        let candidates: Vec<Candidate<'_>> = groups
            .iter()
            .map(|group| {
                let members: Vec<&AgentResponse> = group.iter().map(|&i| voters[i]).collect();
                let weight = group.iter().map(|&i| raw[i]).sum::<f64>() / total;
                let mean_confidence =
                    members.iter().map(|r| r.confidence).sum::<f64>() / members.len() as f64;
                let earliest_sequence = members.iter().map(|r| r.sequence).min().unwrap_or(0);
                Candidate {
                    members,
                    weight,
                    mean_confidence,
                    earliest_sequence,
                }
            })
            .collect();

        let Some(selected) = (0..candidates.len())
            .min_by(|&a, &b| rank(&candidates[a], &candidates[b]))
        else {
            return Ok(ConsensusRecord::insufficient(deliberation_id, threshold, None));
        };
        let winner = &candidates[selected];
        let agreement_fraction = winner.weight.clamp(0.0, 1.0);

        let (disposition, final_response, confidence_score) = if threshold.is_met(agreement_fraction)
        {
            let best = most_confident(&winner.members);
            (
                Disposition::ConsensusReached,
                best,
                agreement_fraction * winner.mean_confidence,
            )
        } else {
            let best = most_confident(&voters);
            (
                Disposition::NoConsensus,
                best,
                best.confidence * agreement_fraction,
            )
        };

        let dissenting_responders = voters
            .iter()
            .filter(|r| !winner.members.iter().any(|m| m.id == r.id))
            .map(|r| r.responder_id.clone())
            .collect();

        let clusters = candidates
            .iter()
            .enumerate()
            .map(|(index, c)| to_cluster(index, c, &claim_sets, &groups[index]))
            .collect();

        Ok(ConsensusRecord {
            deliberation_id,
            disposition,
            clusters,
            selected_cluster: Some(selected),
            agreement_fraction,
            threshold,
            final_response_id: Some(final_response.id),
            final_responder_id: Some(final_response.responder_id.clone()),
            final_response: Some(final_response.answer.clone()),
            confidence_score: confidence_score.clamp(0.0, 100.0),
            dissenting_responders,
            method: CONSENSUS_METHOD.to_string(),
            created_at: Utc::now(),
        })
    }
}

/// `Less` means `a` wins
fn rank(a: &Candidate<'_>, b: &Candidate<'_>) -> Ordering {
    let by_weight = if (a.weight - b.weight).abs() <= WEIGHT_EPSILON {
        Ordering::Equal
    } else {
        b.weight.total_cmp(&a.weight)
    };
    by_weight
        .then_with(|| b.mean_confidence.total_cmp(&a.mean_confidence))
        .then_with(|| a.earliest_sequence.cmp(&b.earliest_sequence))
}

/// Highest self-confidence, earliest receipt on ties
///
/// `members` must be non-empty and sorted by sequence.
fn most_confident<'a>(members: &[&'a AgentResponse]) -> &'a AgentResponse {
    let mut best = members[0];
    for r in &members[1..] {
        if r.confidence > best.confidence {
            best = r;
        }
    }
    best
}

fn to_cluster(
    index: usize,
    candidate: &Candidate<'_>,
    claim_sets: &[ClaimSet],
    group: &[usize],
) -> AgreementCluster {
    let mut claims: Vec<String> = group
        .iter()
        .flat_map(|&i| claim_sets[i].iter().cloned())
        .collect();
    claims.sort();
    claims.dedup();
    AgreementCluster {
        index,
        response_ids: candidate.members.iter().map(|r| r.id).collect(),
        responder_ids: candidate
            .members
            .iter()
            .map(|r| r.responder_id.clone())
            .collect(),
        weight: candidate.weight,
        mean_confidence: candidate.mean_confidence,
        earliest_sequence: candidate.earliest_sequence,
        claims,
    }
}
