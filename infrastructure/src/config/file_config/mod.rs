//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and converted to application types at
//! startup.

mod council;
mod health;
mod logging;
mod responders;
mod server;

pub use council::FileCouncilConfig;
pub use health::FileHealthConfig;
pub use logging::FileLoggingConfig;
pub use responders::{FileResponderConfig, FileResponderKind, trust_weights};
pub use server::FileServerConfig;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Configuration validation errors
#[derive(Debug, Error, PartialEq)]
pub enum ConfigValidationError {
    #[error("council.{0} cannot be 0")]
    ZeroTimeout(&'static str),

    #[error("council.deadline_ms ({deadline_ms}) is shorter than council.agent_timeout_ms ({agent_timeout_ms})")]
    DeadlineShorterThanTimeout {
        deadline_ms: u64,
        agent_timeout_ms: u64,
    },

    #[error("council.consensus_threshold must be in (0, 1], got {0}")]
    InvalidThreshold(f64),

    #[error("council.claim_match_ratio must be in [0, 1), got {0}")]
    InvalidClaimMatchRatio(f64),

    #[error("responder id cannot be empty")]
    EmptyResponderId,

    #[error("duplicate responder id: {0}")]
    DuplicateResponderId(String),

    #[error("http responder '{0}' has no endpoint")]
    MissingEndpoint(String),
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Deliberation settings
    pub council: FileCouncilConfig,
    /// Responder health settings
    pub health: FileHealthConfig,
    /// Registered responders
    pub responders: Vec<FileResponderConfig>,
    /// HTTP API settings
    pub server: FileServerConfig,
    /// Log destinations
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    /// Validate the configuration, stopping at the first problem
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        let council = &self.council;
        if council.agent_timeout_ms == 0 {
            return Err(ConfigValidationError::ZeroTimeout("agent_timeout_ms"));
        }
        if council.deadline_ms == 0 {
            return Err(ConfigValidationError::ZeroTimeout("deadline_ms"));
        }
        if council.deadline_ms < council.agent_timeout_ms {
            return Err(ConfigValidationError::DeadlineShorterThanTimeout {
                deadline_ms: council.deadline_ms,
                agent_timeout_ms: council.agent_timeout_ms,
            });
        }
        if council.parse_threshold().is_none() {
            return Err(ConfigValidationError::InvalidThreshold(
                council.consensus_threshold,
            ));
        }
        if !(0.0..1.0).contains(&council.claim_match_ratio) {
            return Err(ConfigValidationError::InvalidClaimMatchRatio(
                council.claim_match_ratio,
            ));
        }

        let mut seen = HashSet::new();
        for responder in &self.responders {
            let id = responder.id.trim();
            if id.is_empty() {
                return Err(ConfigValidationError::EmptyResponderId);
            }
            if !seen.insert(id) {
                return Err(ConfigValidationError::DuplicateResponderId(id.to_string()));
            }
            if let FileResponderKind::Http { endpoint, .. } = &responder.kind
                && endpoint.trim().is_empty()
            {
                return Err(ConfigValidationError::MissingEndpoint(id.to_string()));
            }
        }

        Ok(())
    }
}
