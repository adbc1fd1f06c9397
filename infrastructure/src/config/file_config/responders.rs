//! Responder registrations from TOML (`[[responders]]` tables)
//!
//! Every responder is declared at startup. The `kind` key picks the
//! adapter:
//!
//! ```toml
//! [[responders]]
//! id = "clinical"
//! name = "Clinical guidelines agent"
//! capability = "clinical"
//! trust_weight = 1.5
//! kind = "http"
//! endpoint = "https://agents.internal/clinical/respond"
//! bearer_token = "..."
//!
//! [[responders]]
//! id = "fixture"
//! name = "Fixture agent"
//! kind = "scripted"
//! answer = "42 beds are free"
//! claims = ["42 beds are free"]
//! confidence = 80.0
//! evidence = ["bed-board:ward-3"]
//! ```

use council_domain::{ResponderId, ResponderProfile, TrustWeights};
use serde::{Deserialize, Serialize};

/// One `[[responders]]` entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileResponderConfig {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub capability: Option<String>,
    /// Vote weight; unset means 1.0
    #[serde(default)]
    pub trust_weight: Option<f64>,
    #[serde(flatten)]
    pub kind: FileResponderKind,
}

/// Adapter-specific settings, tagged by `kind`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FileResponderKind {
    /// Remote agent called over HTTP with a JSON body
    Http {
        #[serde(default)]
        endpoint: String,
        #[serde(default)]
        bearer_token: Option<String>,
        /// Optional liveness URL used by the self-probe
        #[serde(default)]
        probe_endpoint: Option<String>,
    },
    /// Fixed answer, for demos and local testing
    Scripted {
        answer: String,
        #[serde(default)]
        claims: Vec<String>,
        #[serde(default = "default_scripted_confidence")]
        confidence: f64,
        #[serde(default)]
        evidence: Vec<String>,
        #[serde(default)]
        delay_ms: Option<u64>,
        /// Error message to fail with instead of answering
        #[serde(default)]
        fail: Option<String>,
    },
}

fn default_scripted_confidence() -> f64 {
    50.0
}

impl FileResponderConfig {
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            FileResponderKind::Http { .. } => "http",
            FileResponderKind::Scripted { .. } => "scripted",
        }
    }

    pub fn profile(&self) -> ResponderProfile {
        let name = self.name.clone().unwrap_or_else(|| self.id.clone());
        let profile = ResponderProfile::new(self.id.as_str(), name);
        match &self.capability {
            Some(capability) => profile.with_capability(capability.as_str()),
            None => profile,
        }
    }
}

/// Collect the configured trust weights; responders without one weigh 1.0
pub fn trust_weights(responders: &[FileResponderConfig]) -> TrustWeights {
    responders
        .iter()
        .filter_map(|r| r.trust_weight.map(|w| (r.id.as_str(), w)))
        .fold(TrustWeights::new(), |weights, (id, w)| {
            weights.with(ResponderId::from(id), w)
        })
}
