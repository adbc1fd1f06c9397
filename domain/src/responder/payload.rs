//! Request and payload exchanged with a responder

use crate::core::error::DomainError;
use crate::core::ids::DeliberationId;
use crate::core::query::Query;
use serde::{Deserialize, Serialize};

/// What every responder receives for one deliberation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponderRequest {
    pub deliberation_id: DeliberationId,
    pub query: Query,
    /// BCP 47 locale tag the answer should be phrased in
    pub locale: String,
    /// Prior conversational context, oldest first
    #[serde(default)]
    pub context: Vec<String>,
}

impl ResponderRequest {
    pub fn new(deliberation_id: DeliberationId, query: Query) -> Self {
        Self {
            deliberation_id,
            query,
            locale: "en".to_string(),
            context: Vec::new(),
        }
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = locale.into();
        self
    }

    pub fn with_context(mut self, context: Vec<String>) -> Self {
        self.context = context;
        self
    }
}

/// A cited source backing a response
///
/// A reference without a claim index supports every claim of the response
/// that cites it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidenceRef {
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claim_index: Option<usize>,
}

impl EvidenceRef {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            claim_index: None,
        }
    }

    pub fn for_claim(source: impl Into<String>, claim_index: usize) -> Self {
        Self {
            source: source.into(),
            claim_index: Some(claim_index),
        }
    }

    /// Whether this reference backs the claim at `index`
    pub fn supports(&self, index: usize) -> bool {
        self.claim_index.is_none_or(|i| i == index)
    }
}

/// A successful responder answer, before it is attached to a deliberation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponderPayload {
    pub answer: String,
    /// Atomic assertions making up the answer, in order
    #[serde(default)]
    pub claims: Vec<String>,
    #[serde(default)]
    pub evidence: Vec<EvidenceRef>,
    /// Self-reported confidence, 0-100
    pub confidence: f64,
}

impl ResponderPayload {
    pub fn new(answer: impl Into<String>, confidence: f64) -> Self {
        Self {
            answer: answer.into(),
            claims: Vec::new(),
            evidence: Vec::new(),
            confidence,
        }
    }

    pub fn with_claims<I, S>(mut self, claims: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.claims = claims.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_evidence(mut self, evidence: EvidenceRef) -> Self {
        self.evidence.push(evidence);
        self
    }

    /// Schema check applied to every payload before it may vote
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.answer.trim().is_empty() {
            return Err(DomainError::InvalidPayload("answer is empty".into()));
        }
        if !self.confidence.is_finite() || !(0.0..=100.0).contains(&self.confidence) {
            return Err(DomainError::InvalidPayload(format!(
                "confidence {} outside 0-100",
                self.confidence
            )));
        }
        if let Some(i) = self.claims.iter().position(|c| c.trim().is_empty()) {
            return Err(DomainError::InvalidPayload(format!("claim {i} is empty")));
        }
        for evidence in &self.evidence {
            if evidence.source.trim().is_empty() {
                return Err(DomainError::InvalidPayload(
                    "evidence source is empty".into(),
                ));
            }
            if let Some(i) = evidence.claim_index
                && i >= self.claims.len()
            {
                return Err(DomainError::InvalidPayload(format!(
                    "evidence cites claim {i} but only {} claims exist",
                    self.claims.len()
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_payload() {
        let payload = ResponderPayload::new("Revenue was 1.2M", 90.0)
            .with_claims(["revenue is 1.2M", "period is Q3"])
            .with_evidence(EvidenceRef::for_claim("ledger:q3", 0))
            .with_evidence(EvidenceRef::new("report:2024"));
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn test_confidence_out_of_range() {
        let payload = ResponderPayload::new("x", 120.0);
        assert!(matches!(
            payload.validate(),
            Err(DomainError::InvalidPayload(_))
        ));
        let payload = ResponderPayload::new("x", f64::NAN);
        assert!(payload.validate().is_err());
    }

    #[test]
    fn test_empty_answer_rejected() {
        assert!(ResponderPayload::new("  ", 50.0).validate().is_err());
    }

    #[test]
    fn test_evidence_pointing_past_claims_rejected() {
        let payload = ResponderPayload::new("a", 50.0)
            .with_claims(["one"])
            .with_evidence(EvidenceRef::for_claim("src", 3));
        assert!(payload.validate().is_err());
    }

    #[test]
    fn test_evidence_supports() {
        assert!(EvidenceRef::new("s").supports(4));
        assert!(EvidenceRef::for_claim("s", 1).supports(1));
        assert!(!EvidenceRef::for_claim("s", 1).supports(0));
    }
}
