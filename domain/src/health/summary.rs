//! Point-in-time health snapshot and transition events

use super::status::{HealthStatus, OverallHealth};
use crate::core::ids::ResponderId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Snapshot returned by the health monitor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthSummary {
    pub total: usize,
    pub healthy: usize,
    pub degraded: usize,
    /// Responders currently unhealthy
    pub failed: usize,
    pub overall: OverallHealth,
    pub statuses: BTreeMap<ResponderId, HealthStatus>,
    /// Time of the most recent recorded outcome
    pub updated_at: Option<DateTime<Utc>>,
}

impl HealthSummary {
    pub fn from_statuses(
        statuses: BTreeMap<ResponderId, HealthStatus>,
        updated_at: Option<DateTime<Utc>>,
    ) -> Self {
        let count = |s: HealthStatus| statuses.values().filter(|v| **v == s).count();
        let total = statuses.len();
        let healthy = count(HealthStatus::Healthy);
        let degraded = count(HealthStatus::Degraded);
        let failed = count(HealthStatus::Unhealthy);
        Self {
            total,
            healthy,
            degraded,
            failed,
            overall: OverallHealth::from_counts(total, healthy, failed),
            statuses,
            updated_at,
        }
    }
}

/// A responder's status change
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthEvent {
    pub responder_id: ResponderId,
    pub old_status: HealthStatus,
    pub new_status: HealthStatus,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts() {
        let mut statuses = BTreeMap::new();
        statuses.insert(ResponderId::from("a"), HealthStatus::Healthy);
        statuses.insert(ResponderId::from("b"), HealthStatus::Degraded);
        statuses.insert(ResponderId::from("c"), HealthStatus::Unhealthy);
        let summary = HealthSummary::from_statuses(statuses, None);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.healthy, 1);
        assert_eq!(summary.degraded, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.overall, OverallHealth::Degraded);
    }
}
