//! Human-review flags raised against a deliberation

use crate::core::error::DomainError;
use crate::core::ids::{DeliberationId, RequesterId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HallucinationKind {
    FactualError,
    FabricatedData,
    MisleadingContext,
    #[default]
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagSeverity {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

/// Body of a flag request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagRequest {
    pub reason: String,
    #[serde(default)]
    pub hallucination_kind: HallucinationKind,
    #[serde(default)]
    pub severity: FlagSeverity,
}

impl FlagRequest {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            hallucination_kind: HallucinationKind::default(),
            severity: FlagSeverity::default(),
        }
    }

    pub fn with_kind(mut self, kind: HallucinationKind) -> Self {
        self.hallucination_kind = kind;
        self
    }

    pub fn with_severity(mut self, severity: FlagSeverity) -> Self {
        self.severity = severity;
        self
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.reason.trim().is_empty() {
            return Err(DomainError::EmptyFlagReason);
        }
        Ok(())
    }
}

/// A stored flag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliberationFlag {
    pub deliberation_id: DeliberationId,
    pub flagged_by: RequesterId,
    pub reason: String,
    pub hallucination_kind: HallucinationKind,
    pub severity: FlagSeverity,
    pub created_at: DateTime<Utc>,
}

impl DeliberationFlag {
    pub fn new(
        deliberation_id: DeliberationId,
        flagged_by: RequesterId,
        request: FlagRequest,
    ) -> Self {
        Self {
            deliberation_id,
            flagged_by,
            reason: request.reason,
            hallucination_kind: request.hallucination_kind,
            severity: request.severity,
            created_at: Utc::now(),
        }
    }
}
