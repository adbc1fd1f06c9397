//! Consensus threshold value object

use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

/// Tolerance applied when comparing agreement fractions to a threshold
const EPSILON: f64 = 1e-9;

/// Minimum weighted agreement fraction required to declare consensus
///
/// Always within `(0, 1]`.
///
/// # Example
///
/// ```
/// use council_domain::deliberation::ConsensusThreshold;
///
/// let threshold = ConsensusThreshold::default();
/// assert!(threshold.is_met(0.75));  // 3 of 4 agree
/// assert!(!threshold.is_met(0.5));  // 2 of 4 agree
///
/// let strict: ConsensusThreshold = "90%".parse().unwrap();
/// assert_eq!(strict.value(), 0.9);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct ConsensusThreshold(f64);

impl ConsensusThreshold {
    pub const DEFAULT: f64 = 0.66;

    pub fn new(value: f64) -> Result<Self, DomainError> {
        if value.is_finite() && value > 0.0 && value <= 1.0 {
            Ok(Self(value))
        } else {
            Err(DomainError::InvalidThreshold(value))
        }
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// Whether an agreement fraction satisfies this threshold
    pub fn is_met(&self, agreement_fraction: f64) -> bool {
        agreement_fraction + EPSILON >= self.0
    }
}

impl Default for ConsensusThreshold {
    fn default() -> Self {
        Self(Self::DEFAULT)
    }
}

impl TryFrom<f64> for ConsensusThreshold {
    type Error = DomainError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        ConsensusThreshold::new(value)
    }
}

impl From<ConsensusThreshold> for f64 {
    fn from(threshold: ConsensusThreshold) -> Self {
        threshold.0
    }
}

impl std::fmt::Display for ConsensusThreshold {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.0}%", self.0 * 100.0)
    }
}

impl std::str::FromStr for ConsensusThreshold {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let value = if let Some(pct) = s.strip_suffix('%') {
            pct.trim()
                .parse::<f64>()
                .map_err(|_| format!("Invalid percentage: {}", s))?
                / 100.0
        } else {
            s.parse::<f64>()
                .map_err(|_| format!("Invalid threshold: {}. Use a fraction (0.66) or N%", s))?
        };
        ConsensusThreshold::new(value).map_err(|e| e.to_string())
    }
}
