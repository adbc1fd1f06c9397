//! Responder that replays a fixed answer
//!
//! Used for demos, local smoke tests and as a stand-in while a remote agent
//! is unavailable. The answer, claims and evidence come from config.

use async_trait::async_trait;
use council_application::{AgentResponder, ResponderError};
use council_domain::{EvidenceRef, ResponderPayload, ResponderProfile, ResponderRequest};
use std::time::Duration;
use tracing::debug;

pub struct ScriptedResponder {
    profile: ResponderProfile,
    payload: ResponderPayload,
    delay: Duration,
    failure: Option<String>,
}

impl ScriptedResponder {
    pub fn new(profile: ResponderProfile, payload: ResponderPayload) -> Self {
        Self {
            profile,
            payload,
            delay: Duration::ZERO,
            failure: None,
        }
    }

    /// Build from config fields; evidence sources support every claim
    pub fn from_parts(
        profile: ResponderProfile,
        answer: &str,
        claims: &[String],
        confidence: f64,
        evidence: &[String],
    ) -> Self {
        let payload = evidence.iter().fold(
            ResponderPayload::new(answer, confidence).with_claims(claims.iter().cloned()),
            |payload, source| payload.with_evidence(EvidenceRef::new(source.as_str())),
        );
        Self::new(profile, payload)
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Fail every call with `message` instead of answering
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }
}

#[async_trait]
impl AgentResponder for ScriptedResponder {
    fn profile(&self) -> &ResponderProfile {
        &self.profile
    }

    async fn respond(
        &self,
        request: &ResponderRequest,
        timeout: Duration,
    ) -> Result<ResponderPayload, ResponderError> {
        debug!(
            "Scripted responder {} answering deliberation {}",
            self.profile.id, request.deliberation_id
        );
        if self.delay >= timeout {
            tokio::time::sleep(timeout).await;
            return Err(ResponderError::Timeout);
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match &self.failure {
            Some(message) => Err(ResponderError::Agent(message.clone())),
            None => Ok(self.payload.clone()),
        }
    }

    async fn probe(&self) -> Result<(), ResponderError> {
        match &self.failure {
            Some(message) => Err(ResponderError::Agent(message.clone())),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use council_domain::{DeliberationId, Query};

    fn request() -> ResponderRequest {
        ResponderRequest::new(DeliberationId::new(), Query::new("beds free?").unwrap())
    }

    fn responder() -> ScriptedResponder {
        ScriptedResponder::from_parts(
            ResponderProfile::new("fixture", "Fixture"),
            "42 beds",
            &["42 beds are free".to_string()],
            75.0,
            &["bed-board".to_string()],
        )
    }

    #[tokio::test]
    async fn test_returns_configured_payload() {
        let payload = responder()
            .respond(&request(), Duration::from_secs(1))
            .await
            .unwrap();
        assert_eq!(payload.answer, "42 beds");
        assert_eq!(payload.claims, vec!["42 beds are free"]);
        assert_eq!(payload.evidence, vec![EvidenceRef::new("bed-board")]);
        assert!(payload.validate().is_ok());
    }

    #[tokio::test]
    async fn test_failing_responder() {
        let r = responder().failing("model overloaded");
        assert_eq!(
            r.respond(&request(), Duration::from_secs(1)).await,
            Err(ResponderError::Agent("model overloaded".to_string()))
        );
        assert!(r.probe().await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_beyond_timeout_times_out() {
        let r = responder().with_delay(Duration::from_secs(30));
        assert_eq!(
            r.respond(&request(), Duration::from_secs(2)).await,
            Err(ResponderError::Timeout)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_within_timeout_answers() {
        let r = responder().with_delay(Duration::from_millis(500));
        assert!(r.respond(&request(), Duration::from_secs(2)).await.is_ok());
    }
}
