//! Health Monitor
//!
//! Tracks a rolling outcome window per responder and derives its status.
//!
//! Concurrency: the set of responders is fixed at construction. Each
//! responder's window sits behind its own mutex, held only while one
//! outcome is recorded. The derived status and the last-update time are
//! mirrored into atomics, so [`HealthMonitor::status`] and
//! [`HealthMonitor::summary`] never wait on a writer. A summary may lag
//! the newest outcome by one update.
//!
//! Recovery: an unhealthy responder is kept out of deliberations for the
//! policy cooldown, then [`HealthMonitor::is_eligible`] admits it for a
//! single trial call. A failed trial starts a new cooldown; a successful
//! one breaks the failure streak and the window takes over again.

use crate::ports::audit_logger::{AuditAction, AuditEvent, AuditLogger, NoAuditLogger};
use chrono::{DateTime, Utc};
use council_domain::{
    AgentResponse, HealthEvent, HealthPolicy, HealthStatus, HealthSummary, ObservedOutcome,
    OutcomeWindow, ResponderId, ResponseOutcome,
};
use serde_json::json;
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicI64, AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Transition events kept in memory
pub const MAX_HEALTH_EVENTS: usize = 100;

const NEVER_UPDATED: i64 = i64::MIN;

struct Tracker {
    window: Mutex<OutcomeWindow>,
    status: AtomicU8,
    /// Millis since `origin` at which an unhealthy responder gets its trial
    trial_at: AtomicU64,
}

impl Tracker {
    fn status(&self) -> HealthStatus {
        HealthStatus::from_u8(self.status.load(Ordering::Acquire))
    }
}

pub struct HealthMonitor {
    policy: HealthPolicy,
    origin: Instant,
    trackers: BTreeMap<ResponderId, Tracker>,
    updated_at: AtomicI64,
    events: Mutex<VecDeque<HealthEvent>>,
    audit: Arc<dyn AuditLogger>,
}

impl HealthMonitor {
    /// Monitor for a fixed set of responders, all starting healthy
    pub fn new(policy: HealthPolicy, responders: impl IntoIterator<Item = ResponderId>) -> Self {
        let trackers = responders
            .into_iter()
            .map(|id| {
                let tracker = Tracker {
                    window: Mutex::new(OutcomeWindow::new(policy.window_size)),
                    status: AtomicU8::new(HealthStatus::Healthy.to_u8()),
                    trial_at: AtomicU64::new(0),
                };
                (id, tracker)
            })
            .collect();
        Self {
            policy,
            origin: Instant::now(),
            trackers,
            updated_at: AtomicI64::new(NEVER_UPDATED),
            events: Mutex::new(VecDeque::with_capacity(MAX_HEALTH_EVENTS)),
            audit: Arc::new(NoAuditLogger),
        }
    }

    pub fn with_audit_logger(mut self, audit: Arc<dyn AuditLogger>) -> Self {
        self.audit = audit;
        self
    }

    pub fn policy(&self) -> &HealthPolicy {
        &self.policy
    }

    /// Current status; `None` for unknown responders
    pub fn status(&self, responder: &ResponderId) -> Option<HealthStatus> {
        self.trackers.get(responder).map(Tracker::status)
    }

    /// Whether a responder may take part in the next deliberation
    ///
    /// Healthy and degraded responders always are. An unhealthy one is
    /// admitted once per cooldown: the first caller after the cooldown
    /// claims the trial and later callers wait for another cooldown.
    pub fn is_eligible(&self, responder: &ResponderId) -> bool {
        let Some(tracker) = self.trackers.get(responder) else {
            return false;
        };
        if tracker.status().is_eligible() {
            return true;
        }

        let now = self.elapsed_millis();
        let trial_at = tracker.trial_at.load(Ordering::Acquire);
        if now < trial_at {
            return false;
        }
        let claimed = tracker
            .trial_at
            .compare_exchange(
                trial_at,
                now.saturating_add(self.cooldown_millis()),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok();
        if claimed {
            info!(
                "Responder {} cooled down for {}s, admitting one trial call",
                responder,
                self.policy.cooldown.as_secs()
            );
        }
        claimed
    }

    /// Record one outcome and return the resulting status
    pub fn record(
        &self,
        responder: &ResponderId,
        outcome: ObservedOutcome,
        latency: Duration,
    ) -> Option<HealthStatus> {
        let Some(tracker) = self.trackers.get(responder) else {
            warn!("Health outcome for unknown responder {}", responder);
            return None;
        };

        let (old, new) = {
            let mut window = tracker.window.lock().unwrap_or_else(|e| e.into_inner());
            window.record(outcome, latency);
            let new = window.status(&self.policy);
            if new == HealthStatus::Unhealthy {
                let trial_at = self.elapsed_millis().saturating_add(self.cooldown_millis());
                tracker.trial_at.store(trial_at, Ordering::Release);
            }
            let old = HealthStatus::from_u8(tracker.status.swap(new.to_u8(), Ordering::AcqRel));
            (old, new)
        };
        self.updated_at
            .store(Utc::now().timestamp_millis(), Ordering::Release);

        if old != new {
            self.on_transition(responder, old, new, outcome);
        } else {
            debug!(
                "Responder {} recorded {:?} ({}ms), still {}",
                responder,
                outcome,
                latency.as_millis(),
                new
            );
        }
        Some(new)
    }

    /// Record the outcome carried by a dispatched response
    pub fn record_response(&self, response: &AgentResponse) -> Option<HealthStatus> {
        let outcome = match response.outcome {
            ResponseOutcome::Succeeded => ObservedOutcome::Success,
            ResponseOutcome::TimedOut => ObservedOutcome::Timeout,
            ResponseOutcome::Errored { .. } => ObservedOutcome::Error,
        };
        self.record(&response.responder_id, outcome, response.latency())
    }

    /// Point-in-time snapshot of every responder's status
    pub fn summary(&self) -> HealthSummary {
        let statuses = self
            .trackers
            .iter()
            .map(|(id, t)| (id.clone(), t.status()))
            .collect();
        let updated_at = match self.updated_at.load(Ordering::Acquire) {
            NEVER_UPDATED => None,
            millis => DateTime::from_timestamp_millis(millis),
        };
        HealthSummary::from_statuses(statuses, updated_at)
    }

    /// Most recent transitions, oldest first
    pub fn events(&self) -> Vec<HealthEvent> {
        let events = self.events.lock().unwrap_or_else(|e| e.into_inner());
        events.iter().cloned().collect()
    }

    fn elapsed_millis(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    fn cooldown_millis(&self) -> u64 {
        u64::try_from(self.policy.cooldown.as_millis()).unwrap_or(u64::MAX)
    }

    fn on_transition(
        &self,
        responder: &ResponderId,
        old: HealthStatus,
        new: HealthStatus,
        outcome: ObservedOutcome,
    ) {
        let reason = match new {
            HealthStatus::Unhealthy => format!(
                "{} consecutive failures",
                self.policy.unhealthy_after
            ),
            HealthStatus::Degraded => "failure rate or p95 latency above limit".to_string(),
            HealthStatus::Healthy => "recovered within limits".to_string(),
        };
        match new {
            HealthStatus::Healthy => info!("Responder {} {} -> {}: {}", responder, old, new, reason),
            _ => warn!("Responder {} {} -> {}: {}", responder, old, new, reason),
        }

        let event = HealthEvent {
            responder_id: responder.clone(),
            old_status: old,
            new_status: new,
            reason,
            timestamp: Utc::now(),
        };
        self.audit.log(AuditEvent::new(
            AuditAction::HealthTransition,
            json!({
                "responder_id": event.responder_id,
                "old_status": event.old_status,
                "new_status": event.new_status,
                "reason": event.reason,
                "last_outcome": outcome,
            }),
        ));

        let mut events = self.events.lock().unwrap_or_else(|e| e.into_inner());
        if events.len() == MAX_HEALTH_EVENTS {
            events.pop_front();
        }
        events.push_back(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use council_domain::{DeliberationId, OverallHealth};
    use std::sync::Mutex as StdMutex;

    const FAST: Duration = Duration::from_millis(5);

    fn monitor(ids: &[&str]) -> HealthMonitor {
        HealthMonitor::new(
            HealthPolicy::default(),
            ids.iter().map(|id| ResponderId::from(*id)),
        )
    }

    struct RecordingAudit {
        actions: StdMutex<Vec<&'static str>>,
    }

    impl AuditLogger for RecordingAudit {
        fn log(&self, event: AuditEvent) {
            self.actions.lock().unwrap().push(event.action.as_str());
        }
    }

    #[test]
    fn test_starts_healthy() {
        let m = monitor(&["a", "b"]);
        let summary = m.summary();
        assert_eq!(summary.total, 2);
        assert_eq!(summary.healthy, 2);
        assert_eq!(summary.overall, OverallHealth::Healthy);
        assert!(summary.updated_at.is_none());
    }

    #[test]
    fn test_three_failures_then_one_success() {
        let m = monitor(&["a"]);
        let a = ResponderId::from("a");
        m.record(&a, ObservedOutcome::Timeout, FAST);
        m.record(&a, ObservedOutcome::Error, FAST);
        assert!(m.is_eligible(&a));
        m.record(&a, ObservedOutcome::Error, FAST);
        assert_eq!(m.status(&a), Some(HealthStatus::Unhealthy));
        assert!(!m.is_eligible(&a));

        let after = m.record(&a, ObservedOutcome::Success, FAST);
        assert_eq!(after, Some(HealthStatus::Degraded));
        assert!(m.is_eligible(&a));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cooldown_admits_one_trial() {
        let m = HealthMonitor::new(
            HealthPolicy::default().with_cooldown(Duration::from_secs(30)),
            [ResponderId::from("a")],
        );
        let a = ResponderId::from("a");
        for _ in 0..3 {
            m.record(&a, ObservedOutcome::Error, FAST);
        }
        assert!(!m.is_eligible(&a));

        tokio::time::advance(Duration::from_secs(29)).await;
        assert!(!m.is_eligible(&a));

        tokio::time::advance(Duration::from_secs(2)).await;
        assert!(m.is_eligible(&a));
        // trial already handed out
        assert!(!m.is_eligible(&a));
        assert_eq!(m.status(&a), Some(HealthStatus::Unhealthy));

        // failed trial restarts the cooldown
        m.record(&a, ObservedOutcome::Timeout, FAST);
        tokio::time::advance(Duration::from_secs(20)).await;
        assert!(!m.is_eligible(&a));
        tokio::time::advance(Duration::from_secs(11)).await;
        assert!(m.is_eligible(&a));

        m.record(&a, ObservedOutcome::Success, FAST);
        assert_eq!(m.status(&a), Some(HealthStatus::Degraded));
        assert!(m.is_eligible(&a));
        assert!(m.is_eligible(&a));
    }

    #[test]
    fn test_transitions_are_kept_and_audited() {
        let audit = Arc::new(RecordingAudit {
            actions: StdMutex::new(Vec::new()),
        });
        let m = monitor(&["a"]).with_audit_logger(audit.clone());
        let a = ResponderId::from("a");
        // healthy -> degraded -> unhealthy
        for _ in 0..3 {
            m.record(&a, ObservedOutcome::Error, FAST);
        }
        let events = m.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].new_status, HealthStatus::Degraded);
        assert_eq!(events[1].old_status, HealthStatus::Degraded);
        assert_eq!(events[1].new_status, HealthStatus::Unhealthy);
        assert_eq!(
            *audit.actions.lock().unwrap(),
            vec!["health_transition", "health_transition"]
        );
    }

    #[test]
    fn test_event_history_is_bounded() {
        let m = monitor(&["a"]);
        let a = ResponderId::from("a");
        // every cycle goes unhealthy and back to degraded
        for _ in 0..200 {
            for _ in 0..3 {
                m.record(&a, ObservedOutcome::Error, FAST);
            }
            m.record(&a, ObservedOutcome::Success, FAST);
        }
        assert_eq!(m.events().len(), MAX_HEALTH_EVENTS);
    }

    #[test]
    fn test_unknown_responder_is_ignored() {
        let m = monitor(&["a"]);
        assert_eq!(m.record(&"ghost".into(), ObservedOutcome::Error, FAST), None);
        assert!(!m.is_eligible(&"ghost".into()));
        assert_eq!(m.summary().total, 1);
    }

    #[test]
    fn test_record_response_maps_outcome() {
        let m = monitor(&["a"]);
        let did = DeliberationId::new();
        for seq in 0..3 {
            let r = AgentResponse::timed_out(did, "a".into(), Duration::from_secs(10), seq);
            m.record_response(&r);
        }
        assert_eq!(m.status(&"a".into()), Some(HealthStatus::Unhealthy));
        let summary = m.summary();
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.overall, OverallHealth::Critical);
        assert!(summary.updated_at.is_some());
    }

    #[test]
    fn test_concurrent_writers_and_readers() {
        let m = Arc::new(monitor(&["a", "b"]));
        let mut handles = Vec::new();
        for i in 0..8 {
            let m = Arc::clone(&m);
            handles.push(std::thread::spawn(move || {
                let id = ResponderId::from(if i % 2 == 0 { "a" } else { "b" });
                for _ in 0..100 {
                    m.record(&id, ObservedOutcome::Success, FAST);
                    let _ = m.summary();
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(m.summary().healthy, 2);
    }
}
