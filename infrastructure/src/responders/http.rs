//! Remote responder called over HTTP
//!
//! The request is POSTed as JSON (`deliberation_id`, `query`, `locale`,
//! `context`) and the agent answers with a JSON payload (`answer`,
//! `claims`, `evidence`, `confidence`). Transport failures map onto the
//! typed [`ResponderError`] variants.

use async_trait::async_trait;
use council_application::{AgentResponder, ResponderError};
use council_domain::{ResponderPayload, ResponderProfile, ResponderRequest};
use std::time::Duration;
use tracing::{debug, warn};

/// Longest error body echoed back in an error message
const MAX_ERROR_BODY: usize = 200;

pub struct HttpResponder {
    profile: ResponderProfile,
    client: reqwest::Client,
    endpoint: String,
    bearer_token: Option<String>,
    probe_endpoint: Option<String>,
}

impl HttpResponder {
    pub fn new(
        profile: ResponderProfile,
        client: reqwest::Client,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            profile,
            client,
            endpoint: endpoint.into(),
            bearer_token: None,
            probe_endpoint: None,
        }
    }

    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// URL the self-probe GETs; without one the responder is not probed
    pub fn with_probe_endpoint(mut self, url: impl Into<String>) -> Self {
        self.probe_endpoint = Some(url.into());
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.bearer_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }
}

fn map_transport_error(e: reqwest::Error) -> ResponderError {
    if e.is_timeout() {
        ResponderError::Timeout
    } else if e.is_decode() {
        ResponderError::InvalidResponse(e.to_string())
    } else {
        ResponderError::Agent(e.to_string())
    }
}

async fn status_error(response: reqwest::Response) -> ResponderError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let body: String = body.chars().take(MAX_ERROR_BODY).collect();
    ResponderError::Agent(format!(
        "HTTP {} {}: {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Unknown"),
        body.trim()
    ))
}

#[async_trait]
impl AgentResponder for HttpResponder {
    fn profile(&self) -> &ResponderProfile {
        &self.profile
    }

    async fn respond(
        &self,
        request: &ResponderRequest,
        timeout: Duration,
    ) -> Result<ResponderPayload, ResponderError> {
        debug!(
            "POST {} for deliberation {}",
            self.endpoint, request.deliberation_id
        );
        let response = self
            .authorize(self.client.post(&self.endpoint))
            .timeout(timeout)
            .json(request)
            .send()
            .await
            .map_err(map_transport_error)?;

        if !response.status().is_success() {
            let error = status_error(response).await;
            warn!("Responder {} returned {}", self.profile.id, error);
            return Err(error);
        }

        response
            .json::<ResponderPayload>()
            .await
            .map_err(map_transport_error)
    }

    async fn probe(&self) -> Result<(), ResponderError> {
        let Some(url) = &self.probe_endpoint else {
            return Err(ResponderError::Unsupported);
        };
        let response = self
            .authorize(self.client.get(url))
            .send()
            .await
            .map_err(map_transport_error)?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(status_error(response).await)
        }
    }
}
