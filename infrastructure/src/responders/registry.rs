//! Startup registry: config entries to responder adapters

use super::http::HttpResponder;
use super::scripted::ScriptedResponder;
use crate::config::{FileResponderConfig, FileResponderKind};
use council_application::AgentResponder;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Build one adapter per configured responder, in config order
///
/// HTTP responders share one connection pool.
pub fn build_responders(
    configs: &[FileResponderConfig],
) -> Result<Vec<Arc<dyn AgentResponder>>, RegistryError> {
    let client = reqwest::Client::builder()
        .user_agent(concat!("council-engine/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let responders = configs
        .iter()
        .map(|config| {
            let profile = config.profile();
            info!("Registering {} responder {}", config.kind_name(), profile);
            let responder: Arc<dyn AgentResponder> = match &config.kind {
                FileResponderKind::Http {
                    endpoint,
                    bearer_token,
                    probe_endpoint,
                } => {
                    let mut responder =
                        HttpResponder::new(profile, client.clone(), endpoint.as_str());
                    if let Some(token) = bearer_token {
                        responder = responder.with_bearer_token(token.as_str());
                    }
                    if let Some(url) = probe_endpoint {
                        responder = responder.with_probe_endpoint(url.as_str());
                    }
                    Arc::new(responder)
                }
                FileResponderKind::Scripted {
                    answer,
                    claims,
                    confidence,
                    evidence,
                    delay_ms,
                    fail,
                } => {
                    let mut responder = ScriptedResponder::from_parts(
                        profile,
                        answer,
                        claims,
                        *confidence,
                        evidence,
                    );
                    if let Some(ms) = delay_ms {
                        responder = responder.with_delay(Duration::from_millis(*ms));
                    }
                    if let Some(message) = fail {
                        responder = responder.failing(message.as_str());
                    }
                    Arc::new(responder)
                }
            };
            responder
        })
        .collect();

    Ok(responders)
}
