//! One responder's contribution to one deliberation

use crate::core::ids::{DeliberationId, ResponderId, ResponseId};
use crate::responder::{EvidenceRef, ResponderPayload};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How a responder call ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ResponseOutcome {
    Succeeded,
    TimedOut,
    Errored { message: String },
}

impl ResponseOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ResponseOutcome::Succeeded)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseOutcome::Succeeded => "succeeded",
            ResponseOutcome::TimedOut => "timed_out",
            ResponseOutcome::Errored { .. } => "errored",
        }
    }
}

/// A recorded responder answer or failure
///
/// Failed calls are recorded too, so gaps in coverage stay visible.
/// Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentResponse {
    pub id: ResponseId,
    pub deliberation_id: DeliberationId,
    pub responder_id: ResponderId,
    #[serde(default)]
    pub answer: String,
    #[serde(default)]
    pub claims: Vec<String>,
    #[serde(default)]
    pub evidence: Vec<EvidenceRef>,
    /// Self-reported confidence, 0-100 (0 for failures)
    pub confidence: f64,
    pub latency_ms: u64,
    #[serde(flatten)]
    pub outcome: ResponseOutcome,
    /// Logical receipt order within the deliberation
    pub sequence: u64,
    pub created_at: DateTime<Utc>,
}

impl AgentResponse {
    pub fn succeeded(
        deliberation_id: DeliberationId,
        responder_id: ResponderId,
        payload: ResponderPayload,
        latency: Duration,
        sequence: u64,
    ) -> Self {
        Self {
            id: ResponseId::new(),
            deliberation_id,
            responder_id,
            answer: payload.answer,
            claims: payload.claims,
            evidence: payload.evidence,
            confidence: payload.confidence,
            latency_ms: latency.as_millis() as u64,
            outcome: ResponseOutcome::Succeeded,
            sequence,
            created_at: Utc::now(),
        }
    }

    pub fn timed_out(
        deliberation_id: DeliberationId,
        responder_id: ResponderId,
        latency: Duration,
        sequence: u64,
    ) -> Self {
        Self::failed(
            deliberation_id,
            responder_id,
            ResponseOutcome::TimedOut,
            latency,
            sequence,
        )
    }

    pub fn errored(
        deliberation_id: DeliberationId,
        responder_id: ResponderId,
        message: impl Into<String>,
        latency: Duration,
        sequence: u64,
    ) -> Self {
        Self::failed(
            deliberation_id,
            responder_id,
            ResponseOutcome::Errored {
                message: message.into(),
            },
            latency,
            sequence,
        )
    }

    fn failed(
        deliberation_id: DeliberationId,
        responder_id: ResponderId,
        outcome: ResponseOutcome,
        latency: Duration,
        sequence: u64,
    ) -> Self {
        Self {
            id: ResponseId::new(),
            deliberation_id,
            responder_id,
            answer: String::new(),
            claims: Vec::new(),
            evidence: Vec::new(),
            confidence: 0.0,
            latency_ms: latency.as_millis() as u64,
            outcome,
            sequence,
            created_at: Utc::now(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_success()
    }

    pub fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms)
    }

    /// Claims used for agreement; the answer stands in when none were given
    pub fn effective_claims(&self) -> Vec<&str> {
        if self.claims.is_empty() {
            vec![self.answer.as_str()]
        } else {
            self.claims.iter().map(String::as_str).collect()
        }
    }

    /// Sources cited in support of the claim at `index`
    pub fn sources_for_claim(&self, index: usize) -> Vec<String> {
        self.evidence
            .iter()
            .filter(|e| e.supports(index))
            .map(|e| e.source.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_succeeded_copies_payload() {
        let payload = ResponderPayload::new("answer", 80.0)
            .with_claims(["a", "b"])
            .with_evidence(EvidenceRef::for_claim("src-1", 1));
        let r = AgentResponse::succeeded(
            DeliberationId::new(),
            "agent-a".into(),
            payload,
            Duration::from_millis(120),
            0,
        );
        assert!(r.is_success());
        assert_eq!(r.claims, vec!["a", "b"]);
        assert_eq!(r.latency_ms, 120);
        assert_eq!(r.sources_for_claim(1), vec!["src-1"]);
        assert!(r.sources_for_claim(0).is_empty());
    }

    #[test]
    fn test_failures_have_zero_confidence() {
        let r = AgentResponse::errored(
            DeliberationId::new(),
            "agent-b".into(),
            "boom",
            Duration::from_millis(5),
            3,
        );
        assert!(!r.is_success());
        assert_eq!(r.confidence, 0.0);
        assert_eq!(r.outcome.as_str(), "errored");
    }

    #[test]
    fn test_effective_claims_falls_back_to_answer() {
        let r = AgentResponse::succeeded(
            DeliberationId::new(),
            "agent-a".into(),
            ResponderPayload::new("forty two", 50.0),
            Duration::ZERO,
            0,
        );
        assert_eq!(r.effective_claims(), vec!["forty two"]);
    }

    #[test]
    fn test_outcome_serializes_flat() {
        let r = AgentResponse::timed_out(
            DeliberationId::new(),
            "agent-c".into(),
            Duration::from_secs(10),
            1,
        );
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["status"], "timed_out");
        assert_eq!(json["latency_ms"], 10_000);
    }
}
