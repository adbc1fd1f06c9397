//! Responder identity

use crate::core::ids::ResponderId;
use serde::{Deserialize, Serialize};

/// Identity of a registered responder
///
/// Registered at process start and immutable afterwards; only the health
/// status tracked elsewhere changes over the process lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponderProfile {
    pub id: ResponderId,
    /// Human-readable display name
    pub name: String,
    /// Domain the responder specializes in, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capability: Option<String>,
}

impl ResponderProfile {
    pub fn new(id: impl Into<ResponderId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            capability: None,
        }
    }

    pub fn with_capability(mut self, capability: impl Into<String>) -> Self {
        self.capability = Some(capability.into());
        self
    }
}

impl std::fmt::Display for ResponderProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}
