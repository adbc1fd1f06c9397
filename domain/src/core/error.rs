//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    #[error("Query cannot be empty")]
    EmptyQuery,

    #[error("Consensus threshold must be in (0, 1], got {0}")]
    InvalidThreshold(f64),

    #[error("Invalid deliberation transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Invalid responder payload: {0}")]
    InvalidPayload(String),

    #[error("Response {response} belongs to deliberation {owner}, not {expected}")]
    ForeignResponse {
        response: String,
        owner: String,
        expected: String,
    },

    #[error("Flag reason cannot be empty")]
    EmptyFlagReason,

    #[error("Response {0} is not part of the response set")]
    MissingResponse(String),
}

impl DomainError {
    /// Whether this error stems from caller input rather than engine state
    pub fn is_invalid_request(&self) -> bool {
        matches!(
            self,
            DomainError::EmptyQuery
                | DomainError::InvalidThreshold(_)
                | DomainError::EmptyFlagReason
        )
    }
}
