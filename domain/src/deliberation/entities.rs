//! Deliberation entity

use super::status::DeliberationStatus;
use super::threshold::ConsensusThreshold;
use crate::consensus::record::{ConsensusRecord, Disposition};
use crate::core::error::DomainError;
use crate::core::ids::{DeliberationId, RequesterId};
use crate::core::query::Query;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One request for adjudicated truth (Entity)
///
/// Only the coordinator mutates a deliberation, and only through the
/// transition methods below. Once terminal it cannot change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deliberation {
    pub id: DeliberationId,
    pub query: Query,
    pub query_hash: String,
    pub requester_id: RequesterId,
    pub consensus_threshold: ConsensusThreshold,
    status: DeliberationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    disposition: Option<Disposition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    final_response: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    confidence_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    completed_at: Option<DateTime<Utc>>,
}

impl Deliberation {
    /// Create a `pending` deliberation
    pub fn new(query: Query, requester_id: RequesterId, threshold: ConsensusThreshold) -> Self {
        Self {
            id: DeliberationId::new(),
            query_hash: query.hash(),
            query,
            requester_id,
            consensus_threshold: threshold,
            status: DeliberationStatus::Pending,
            disposition: None,
            final_response: None,
            confidence_score: None,
            error_message: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    pub fn status(&self) -> DeliberationStatus {
        self.status
    }

    pub fn disposition(&self) -> Option<Disposition> {
        self.disposition
    }

    pub fn final_response(&self) -> Option<&str> {
        self.final_response.as_deref()
    }

    pub fn confidence_score(&self) -> Option<f64> {
        self.confidence_score
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// `pending` → `in_progress`
    pub fn start(&mut self) -> Result<(), DomainError> {
        self.transition(DeliberationStatus::InProgress)
    }

    /// `in_progress` → disposition status, copying the adjudicated answer
    pub fn record_consensus(&mut self, record: &ConsensusRecord) -> Result<(), DomainError> {
        if record.deliberation_id != self.id {
            return Err(DomainError::ForeignResponse {
                response: "consensus record".to_string(),
                owner: record.deliberation_id.to_string(),
                expected: self.id.to_string(),
            });
        }
        self.transition(record.disposition.into())?;
        self.disposition = Some(record.disposition);
        self.final_response = record.final_response.clone();
        self.confidence_score = Some(record.confidence_score);
        Ok(())
    }

    /// disposition status → `completed`
    pub fn complete(&mut self) -> Result<(), DomainError> {
        self.transition(DeliberationStatus::Completed)?;
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    /// `pending` | `in_progress` → `failed`
    pub fn fail(&mut self, message: impl Into<String>) -> Result<(), DomainError> {
        self.transition(DeliberationStatus::Failed)?;
        self.error_message = Some(message.into());
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    fn transition(&mut self, next: DeliberationStatus) -> Result<(), DomainError> {
        if !self.status.can_transition_to(next) {
            return Err(DomainError::InvalidTransition {
                from: self.status.to_string(),
                to: next.to_string(),
            });
        }
        self.status = next;
        Ok(())
    }
}
