//! Evidence trail construction
//!
//! For a consensus the whole winning group is walked; otherwise only the
//! chosen best-effort response is. Claims from other successful responses
//! that the final answer does not make are appended as dissent so auditors
//! can see where agreement broke down.

use super::trail::{ClaimProvenance, EvidenceTrail, SupportingEvidence};
use crate::consensus::claims::normalize_claim;
use crate::consensus::record::ConsensusRecord;
use crate::core::error::DomainError;
use crate::deliberation::response::AgentResponse;
use chrono::Utc;

/// Build the trail for `record` from the deliberation's responses
pub fn build_evidence_trail(
    record: &ConsensusRecord,
    responses: &[AgentResponse],
) -> Result<EvidenceTrail, DomainError> {
    if let Some(foreign) = responses
        .iter()
        .find(|r| r.deliberation_id != record.deliberation_id)
    {
        return Err(DomainError::ForeignResponse {
            response: foreign.id.to_string(),
            owner: foreign.deliberation_id.to_string(),
            expected: record.deliberation_id.to_string(),
        });
    }

    let Some(final_id) = record.final_response_id else {
        return Ok(EvidenceTrail::empty(record.deliberation_id));
    };
    let final_response = responses
        .iter()
        .find(|r| r.id == final_id)
        .ok_or_else(|| DomainError::MissingResponse(final_id.to_string()))?;

    let mut successful: Vec<&AgentResponse> = responses.iter().filter(|r| r.is_success()).collect();
    successful.sort_by_key(|r| r.sequence);

    let members: Vec<&AgentResponse> = match record.winning_cluster() {
        Some(cluster) if record.disposition.is_consensus() => successful
            .iter()
            .copied()
            .filter(|r| cluster.contains(&r.id))
            .collect(),
        _ => vec![final_response],
    };

    let mut claims: Vec<ClaimProvenance> = Vec::new();
    for claim in final_response.effective_claims() {
        let normalized = normalize_claim(claim);
        if normalized.is_empty() || claims.iter().any(|c| c.normalized == normalized) {
            continue;
        }
        let supporters = supporters_of(&normalized, &members);
        let corroborated = supporters.iter().any(|s| s.response_id != final_id);
        claims.push(ClaimProvenance {
            claim: claim.to_string(),
            normalized,
            supporters,
            corroborated,
            in_final_response: true,
        });
    }

    for response in successful.iter().filter(|r| r.id != final_id) {
        for claim in response.effective_claims() {
            let normalized = normalize_claim(claim);
            if normalized.is_empty() || claims.iter().any(|c| c.normalized == normalized) {
                continue;
            }
            let supporters = supporters_of(&normalized, &successful);
            claims.push(ClaimProvenance {
                claim: claim.to_string(),
                normalized,
                supporters,
                corroborated: false,
                in_final_response: false,
            });
        }
    }

    Ok(EvidenceTrail {
        deliberation_id: record.deliberation_id,
        final_response_id: Some(final_id),
        claims,
        created_at: Utc::now(),
    })
}

fn supporters_of(normalized: &str, responses: &[&AgentResponse]) -> Vec<SupportingEvidence> {
    responses
        .iter()
        .filter_map(|r| {
            r.effective_claims()
                .into_iter()
                .position(|c| normalize_claim(c) == normalized)
                .map(|index| SupportingEvidence {
                    response_id: r.id,
                    responder_id: r.responder_id.clone(),
                    claim: r.effective_claims()[index].to_string(),
                    sources: r.sources_for_claim(index),
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::engine::ConsensusEngine;
    use crate::consensus::record::Disposition;
    use crate::core::ids::DeliberationId;
    use crate::deliberation::threshold::ConsensusThreshold;
    use crate::responder::{EvidenceRef, ResponderPayload};
    use std::collections::HashSet;
    use std::time::Duration;

    fn response(
        did: DeliberationId,
        responder: &str,
        claims: &[&str],
        confidence: f64,
        sequence: u64,
    ) -> AgentResponse {
        let mut payload =
            ResponderPayload::new(claims.join(" "), confidence).with_claims(claims.iter().copied());
        for (i, _) in claims.iter().enumerate() {
            payload = payload.with_evidence(EvidenceRef::for_claim(format!("{responder}-doc-{i}"), i));
        }
        AgentResponse::succeeded(
            did,
            responder.into(),
            payload,
            Duration::from_millis(20),
            sequence,
        )
    }

    fn evaluate(did: DeliberationId, responses: &[AgentResponse]) -> ConsensusRecord {
        ConsensusEngine::new()
            .evaluate(did, ConsensusThreshold::default(), responses)
            .unwrap()
    }

    #[test]
    fn test_scenario_marks_dissenting_claim_uncorroborated() {
        let did = DeliberationId::new();
        let responses = vec![
            response(did, "a", &["A", "B"], 70.0, 0),
            response(did, "b", &["A", "C"], 95.0, 1),
            response(did, "c", &["A", "B"], 90.0, 2),
            response(did, "d", &["A", "B"], 80.0, 3),
        ];
        let record = evaluate(did, &responses);
        assert_eq!(record.disposition, Disposition::ConsensusReached);

        let trail = build_evidence_trail(&record, &responses).unwrap();
        let finals: Vec<_> = trail.final_claims().collect();
        assert_eq!(finals.len(), 2);
        assert!(finals.iter().all(|c| c.corroborated));
        assert_eq!(finals[0].supporters.len(), 3);

        let c = trail.claims.iter().find(|c| c.normalized == "c").unwrap();
        assert!(!c.corroborated);
        assert!(!c.in_final_response);
        assert_eq!(c.supporters[0].responder_id, "b".into());
        assert_eq!(c.supporters[0].sources, vec!["b-doc-1"]);
    }

    #[test]
    fn test_sources_follow_claim_index() {
        let did = DeliberationId::new();
        let responses = vec![
            response(did, "a", &["A", "B"], 90.0, 0),
            response(did, "b", &["b", "a"], 60.0, 1),
        ];
        let record = evaluate(did, &responses);
        let trail = build_evidence_trail(&record, &responses).unwrap();
        let a = trail.claims.iter().find(|c| c.normalized == "a").unwrap();
        let sources: Vec<&str> = a.sources().collect();
        assert_eq!(sources, vec!["a-doc-0", "b-doc-1"]);
    }

    #[test]
    fn test_no_consensus_walks_only_final_response() {
        let did = DeliberationId::new();
        let responses = vec![
            response(did, "a", &["A"], 50.0, 0),
            response(did, "b", &["B"], 90.0, 1),
        ];
        let record = evaluate(did, &responses);
        assert_eq!(record.disposition, Disposition::NoConsensus);
        let trail = build_evidence_trail(&record, &responses).unwrap();
        let finals: Vec<_> = trail.final_claims().collect();
        assert_eq!(finals.len(), 1);
        assert_eq!(finals[0].normalized, "b");
        assert!(!finals[0].corroborated);
        assert_eq!(finals[0].supporters.len(), 1);
    }

    #[test]
    fn test_insufficient_without_answer_gives_empty_trail() {
        let did = DeliberationId::new();
        let responses = vec![AgentResponse::timed_out(
            did,
            "a".into(),
            Duration::from_secs(10),
            0,
        )];
        let record = evaluate(did, &responses);
        let trail = build_evidence_trail(&record, &responses).unwrap();
        assert!(trail.claims.is_empty());
        assert!(trail.final_response_id.is_none());
    }

    #[test]
    fn test_references_only_own_responses() {
        let did = DeliberationId::new();
        let responses = vec![
            response(did, "a", &["A", "B"], 70.0, 0),
            response(did, "b", &["A", "C"], 95.0, 1),
            response(did, "c", &["A", "B"], 90.0, 2),
        ];
        let record = evaluate(did, &responses);
        let trail = build_evidence_trail(&record, &responses).unwrap();
        let own: HashSet<_> = responses.iter().map(|r| r.id).collect();
        assert!(trail.references_only(&own));
        assert!(!trail.references_only(&HashSet::new()));
    }

    #[test]
    fn test_foreign_responses_rejected() {
        let did = DeliberationId::new();
        let responses = vec![
            response(did, "a", &["A"], 70.0, 0),
            response(did, "b", &["A"], 70.0, 1),
        ];
        let record = evaluate(did, &responses);
        let mut mixed = responses.clone();
        mixed.push(response(DeliberationId::new(), "x", &["A"], 70.0, 2));
        assert!(matches!(
            build_evidence_trail(&record, &mixed),
            Err(DomainError::ForeignResponse { .. })
        ));
    }

    #[test]
    fn test_missing_final_response() {
        let did = DeliberationId::new();
        let responses = vec![
            response(did, "a", &["A"], 70.0, 0),
            response(did, "b", &["A"], 70.0, 1),
        ];
        let record = evaluate(did, &responses);
        assert!(matches!(
            build_evidence_trail(&record, &responses[1..]),
            Err(DomainError::MissingResponse(_))
        ));
    }
}
