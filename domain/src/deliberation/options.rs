//! Per-request deliberation options

use super::threshold::ConsensusThreshold;
use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

/// Caller-supplied overrides for a single deliberation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeliberationOptions {
    /// Overrides the configured consensus threshold; must be in (0, 1]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consensus_threshold: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub context: Vec<String>,
}

impl DeliberationOptions {
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.consensus_threshold = Some(threshold);
        self
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    pub fn with_context(mut self, context: Vec<String>) -> Self {
        self.context = context;
        self
    }

    /// The threshold to use, validating any override
    pub fn resolve_threshold(
        &self,
        default: ConsensusThreshold,
    ) -> Result<ConsensusThreshold, DomainError> {
        match self.consensus_threshold {
            Some(value) => ConsensusThreshold::new(value),
            None => Ok(default),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_uses_default() {
        let opts = DeliberationOptions::default();
        assert_eq!(
            opts.resolve_threshold(ConsensusThreshold::default()).unwrap(),
            ConsensusThreshold::default()
        );
    }

    #[test]
    fn test_resolve_validates_override() {
        let opts = DeliberationOptions::default().with_threshold(0.9);
        assert_eq!(
            opts.resolve_threshold(ConsensusThreshold::default())
                .unwrap()
                .value(),
            0.9
        );

        let bad = DeliberationOptions::default().with_threshold(0.0);
        assert_eq!(
            bad.resolve_threshold(ConsensusThreshold::default()),
            Err(DomainError::InvalidThreshold(0.0))
        );
    }
}
