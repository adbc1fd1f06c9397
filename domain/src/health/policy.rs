//! Thresholds for deriving health from an outcome window

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthPolicy {
    /// Outcomes kept per responder
    pub window_size: usize,
    /// Consecutive trailing failures that make a responder unhealthy
    pub unhealthy_after: usize,
    /// Failure rate above which a responder is degraded
    pub degraded_failure_rate: f64,
    /// p95 latency above which a responder is degraded
    pub latency_ceiling: Duration,
    /// Time an unhealthy responder sits out before one trial call
    pub cooldown: Duration,
}

impl Default for HealthPolicy {
    fn default() -> Self {
        Self {
            window_size: 20,
            unhealthy_after: 3,
            degraded_failure_rate: 0.4,
            latency_ceiling: Duration::from_secs(8),
            cooldown: Duration::from_secs(30),
        }
    }
}

impl HealthPolicy {
    pub fn with_window_size(mut self, size: usize) -> Self {
        self.window_size = size.max(1);
        self
    }

    pub fn with_unhealthy_after(mut self, n: usize) -> Self {
        self.unhealthy_after = n.max(1);
        self
    }

    pub fn with_degraded_failure_rate(mut self, rate: f64) -> Self {
        self.degraded_failure_rate = rate;
        self
    }

    pub fn with_latency_ceiling(mut self, ceiling: Duration) -> Self {
        self.latency_ceiling = ceiling;
        self
    }

    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }
}
