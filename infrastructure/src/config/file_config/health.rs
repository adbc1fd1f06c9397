//! Responder health configuration from TOML (`[health]` section)
//!
//! ```toml
//! [health]
//! window_size = 20
//! unhealthy_after = 3
//! degraded_failure_rate = 0.4
//! latency_ceiling_ms = 8000
//! cooldown_secs = 30
//! probe_interval_secs = 30
//! ```

use council_domain::HealthPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Health window settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileHealthConfig {
    pub window_size: usize,
    pub unhealthy_after: usize,
    pub degraded_failure_rate: f64,
    pub latency_ceiling_ms: u64,
    /// Seconds an unhealthy responder sits out before a trial call; 0 retries every deliberation
    pub cooldown_secs: u64,
    /// Self-probe interval; no background probe when absent
    pub probe_interval_secs: Option<u64>,
}

impl Default for FileHealthConfig {
    fn default() -> Self {
        let policy = HealthPolicy::default();
        Self {
            window_size: policy.window_size,
            unhealthy_after: policy.unhealthy_after,
            degraded_failure_rate: policy.degraded_failure_rate,
            latency_ceiling_ms: policy.latency_ceiling.as_millis() as u64,
            cooldown_secs: policy.cooldown.as_secs(),
            probe_interval_secs: None,
        }
    }
}

impl FileHealthConfig {
    pub fn to_policy(&self) -> HealthPolicy {
        HealthPolicy::default()
            .with_window_size(self.window_size)
            .with_unhealthy_after(self.unhealthy_after)
            .with_degraded_failure_rate(self.degraded_failure_rate)
            .with_latency_ceiling(Duration::from_millis(self.latency_ceiling_ms))
            .with_cooldown(Duration::from_secs(self.cooldown_secs))
    }

    pub fn probe_interval(&self) -> Option<Duration> {
        self.probe_interval_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_config_default() {
        let config = FileHealthConfig::default();
        assert_eq!(config.to_policy(), HealthPolicy::default());
        assert!(config.probe_interval().is_none());
    }

    #[test]
    fn test_zero_probe_interval_disables_probe() {
        let config: FileHealthConfig = toml::from_str("probe_interval_secs = 0").unwrap();
        assert!(config.probe_interval().is_none());

        let config: FileHealthConfig = toml::from_str("probe_interval_secs = 15").unwrap();
        assert_eq!(config.probe_interval(), Some(Duration::from_secs(15)));
    }

    #[test]
    fn test_cooldown_maps_to_policy() {
        let config: FileHealthConfig = toml::from_str("cooldown_secs = 120").unwrap();
        assert_eq!(config.to_policy().cooldown, Duration::from_secs(120));
        assert_eq!(config.window_size, 20);

        assert_eq!(
            FileHealthConfig::default().to_policy().cooldown,
            Duration::from_secs(30)
        );
    }
}
