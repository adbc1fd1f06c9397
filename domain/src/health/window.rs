//! Rolling outcome window
//!
//! Status derivation, evaluated after every recorded outcome:
//!
//! - **unhealthy** when the last `unhealthy_after` outcomes are all failures
//! - **degraded** when the failure rate over the window exceeds
//!   `degraded_failure_rate`, or the nearest-rank p95 latency exceeds
//!   `latency_ceiling`
//! - **healthy** otherwise
//!
//! Recovery follows from the same rule. A single success after three
//! failures clears the trailing streak, but the window still holds a 75%
//! failure rate, so the responder comes back as degraded. It turns healthy
//! only once enough successes push the failure rate down to the threshold.

use super::policy::HealthPolicy;
use super::status::HealthStatus;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;

/// Outcome class of one responder call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObservedOutcome {
    Success,
    Timeout,
    Error,
}

impl ObservedOutcome {
    pub fn is_failure(&self) -> bool {
        !matches!(self, ObservedOutcome::Success)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    pub outcome: ObservedOutcome,
    pub latency: Duration,
}

impl Observation {
    pub fn new(outcome: ObservedOutcome, latency: Duration) -> Self {
        Self { outcome, latency }
    }
}

/// Fixed-capacity window of a responder's most recent outcomes
///
/// # Example
///
/// ```
/// use council_domain::health::{HealthPolicy, HealthStatus, ObservedOutcome, OutcomeWindow};
/// use std::time::Duration;
///
/// let policy = HealthPolicy::default();
/// let mut window = OutcomeWindow::new(policy.window_size);
/// for _ in 0..3 {
///     window.record(ObservedOutcome::Error, Duration::from_millis(5));
/// }
/// assert_eq!(window.status(&policy), HealthStatus::Unhealthy);
///
/// window.record(ObservedOutcome::Success, Duration::from_millis(5));
/// assert_eq!(window.status(&policy), HealthStatus::Degraded);
/// ```
#[derive(Debug, Clone)]
pub struct OutcomeWindow {
    capacity: usize,
    entries: VecDeque<Observation>,
}

impl OutcomeWindow {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    pub fn record(&mut self, outcome: ObservedOutcome, latency: Duration) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(Observation::new(outcome, latency));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn failure_rate(&self) -> f64 {
        if self.entries.is_empty() {
            return 0.0;
        }
        let failures = self
            .entries
            .iter()
            .filter(|o| o.outcome.is_failure())
            .count();
        failures as f64 / self.entries.len() as f64
    }

    /// Failures since the most recent success
    pub fn trailing_failures(&self) -> usize {
        self.entries
            .iter()
            .rev()
            .take_while(|o| o.outcome.is_failure())
            .count()
    }

    /// Nearest-rank 95th percentile latency
    pub fn p95_latency(&self) -> Option<Duration> {
        if self.entries.is_empty() {
            return None;
        }
        let mut latencies: Vec<Duration> = self.entries.iter().map(|o| o.latency).collect();
        latencies.sort();
        let rank = (latencies.len() * 95).div_ceil(100);
        latencies.get(rank.saturating_sub(1)).copied()
    }

    pub fn status(&self, policy: &HealthPolicy) -> HealthStatus {
        if self.trailing_failures() >= policy.unhealthy_after.max(1) {
            return HealthStatus::Unhealthy;
        }
        let slow = self
            .p95_latency()
            .is_some_and(|p95| p95 > policy.latency_ceiling);
        if self.failure_rate() > policy.degraded_failure_rate || slow {
            return HealthStatus::Degraded;
        }
        HealthStatus::Healthy
    }
}
