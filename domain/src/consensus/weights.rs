//! Per-responder trust weights

use crate::core::ids::ResponderId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Relative trust injected into the vote
///
/// Responders without an entry weigh 1.0. The engine divides by the total
/// over the responders that actually answered, so the default is an equal
/// `1 / n` share each.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrustWeights(HashMap<ResponderId, f64>);

impl TrustWeights {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, responder: impl Into<ResponderId>, weight: f64) -> Self {
        self.set(responder, weight);
        self
    }

    pub fn set(&mut self, responder: impl Into<ResponderId>, weight: f64) {
        self.0.insert(responder.into(), weight);
    }

    /// Raw trust for a responder; invalid or negative weights count as 0
    pub fn raw(&self, responder: &ResponderId) -> f64 {
        match self.0.get(responder) {
            Some(w) if w.is_finite() && *w > 0.0 => *w,
            Some(_) => 0.0,
            None => 1.0,
        }
    }

    /// Raw weights for the given voters, in order
    ///
    /// When every voter weighs zero the vote falls back to equal weights.
    pub fn effective<'a>(&self, voters: impl IntoIterator<Item = &'a ResponderId>) -> Vec<f64> {
        let raw: Vec<f64> = voters.into_iter().map(|r| self.raw(r)).collect();
        if raw.iter().sum::<f64>() <= 0.0 {
            return vec![1.0; raw.len()];
        }
        raw
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
