//! Agent responder port
//!
//! Every agent taking part in a deliberation sits behind this interface.
//! Implementations (adapters) live in the infrastructure layer and are
//! registered once at process start.

use async_trait::async_trait;
use council_domain::{ResponderPayload, ResponderProfile, ResponderRequest};
use std::time::Duration;
use thiserror::Error;

/// Typed failure of a single responder call
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ResponderError {
    #[error("Responder timed out")]
    Timeout,

    #[error("Agent error: {0}")]
    Agent(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Not supported by this responder")]
    Unsupported,
}

/// A participant in council deliberations
///
/// Responders must be idempotent for identical requests. The engine never
/// retries a call within one deliberation.
#[async_trait]
pub trait AgentResponder: Send + Sync {
    /// Identity of this responder
    fn profile(&self) -> &ResponderProfile;

    /// Answer a request within `timeout`
    async fn respond(
        &self,
        request: &ResponderRequest,
        timeout: Duration,
    ) -> Result<ResponderPayload, ResponderError>;

    /// Lightweight liveness check used by the optional self-probe
    ///
    /// Responders without one return [`ResponderError::Unsupported`], and
    /// nothing is recorded for them.
    async fn probe(&self) -> Result<(), ResponderError> {
        Err(ResponderError::Unsupported)
    }
}
