//! Optional periodic self-probe
//!
//! Probe outcomes go through [`HealthMonitor::record`], the same write path
//! dispatched deliberations use, so status derivation is unchanged.
//! Responders that report [`ResponderError::Unsupported`] are skipped.

use super::monitor::HealthMonitor;
use crate::ports::agent_responder::{AgentResponder, ResponderError};
use council_domain::ObservedOutcome;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Probe every responder each `interval` until `cancel` fires
///
/// The first round runs one interval after start. Each probe is bounded
/// by `timeout`.
pub fn spawn_health_probe(
    monitor: Arc<HealthMonitor>,
    responders: Vec<Arc<dyn AgentResponder>>,
    interval: Duration,
    timeout: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            "Health probe every {}s for {} responders",
            interval.as_secs(),
            responders.len()
        );
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = probe_round(&monitor, &responders, timeout) => {}
                    }
                }
            }
        }
        debug!("Health probe stopped");
    })
}

async fn probe_round(
    monitor: &HealthMonitor,
    responders: &[Arc<dyn AgentResponder>],
    timeout: Duration,
) {
    let mut join_set = JoinSet::new();
    for responder in responders {
        let responder = Arc::clone(responder);
        join_set.spawn(async move {
            let started = Instant::now();
            let outcome = match tokio::time::timeout(timeout, responder.probe()).await {
                Ok(Ok(())) => Some(ObservedOutcome::Success),
                Ok(Err(ResponderError::Unsupported)) => None,
                Ok(Err(ResponderError::Timeout)) | Err(_) => Some(ObservedOutcome::Timeout),
                Ok(Err(_)) => Some(ObservedOutcome::Error),
            };
            (responder.profile().id.clone(), outcome, started.elapsed())
        });
    }
    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok((id, Some(outcome), latency)) => {
                monitor.record(&id, outcome, latency);
            }
            Ok((id, None, _)) => debug!("Responder {} has no health check, skipped", id),
            Err(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use council_domain::{
        HealthPolicy, HealthStatus, ResponderId, ResponderPayload, ResponderProfile,
        ResponderRequest,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ProbeOnly {
        profile: ResponderProfile,
        healthy: bool,
        probes: AtomicUsize,
    }

    #[async_trait]
    impl AgentResponder for ProbeOnly {
        fn profile(&self) -> &ResponderProfile {
            &self.profile
        }

        async fn respond(
            &self,
            _request: &ResponderRequest,
            _timeout: Duration,
        ) -> Result<ResponderPayload, ResponderError> {
            Err(ResponderError::Agent("not used".to_string()))
        }

        async fn probe(&self) -> Result<(), ResponderError> {
            self.probes.fetch_add(1, Ordering::SeqCst);
            if self.healthy {
                Ok(())
            } else {
                Err(ResponderError::Agent("down".to_string()))
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_records_outcomes_until_cancelled() {
        let down = Arc::new(ProbeOnly {
            profile: ResponderProfile::new("down", "Down"),
            healthy: false,
            probes: AtomicUsize::new(0),
        });
        let up = Arc::new(ProbeOnly {
            profile: ResponderProfile::new("up", "Up"),
            healthy: true,
            probes: AtomicUsize::new(0),
        });
        let monitor = Arc::new(HealthMonitor::new(
            HealthPolicy::default(),
            [ResponderId::from("down"), ResponderId::from("up")],
        ));
        let cancel = CancellationToken::new();
        let responders: Vec<Arc<dyn AgentResponder>> = vec![down.clone(), up.clone()];
        let handle = spawn_health_probe(
            Arc::clone(&monitor),
            responders,
            Duration::from_secs(10),
            Duration::from_secs(1),
            cancel.clone(),
        );

        tokio::time::sleep(Duration::from_secs(35)).await;
        cancel.cancel();
        handle.await.unwrap();

        assert_eq!(down.probes.load(Ordering::SeqCst), 3);
        assert_eq!(monitor.status(&"down".into()), Some(HealthStatus::Unhealthy));
        assert_eq!(monitor.status(&"up".into()), Some(HealthStatus::Healthy));

        let probes = up.probes.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(up.probes.load(Ordering::SeqCst), probes);
    }

    /// Answers nothing and keeps the default health check
    struct Dead {
        profile: ResponderProfile,
    }

    #[async_trait]
    impl AgentResponder for Dead {
        fn profile(&self) -> &ResponderProfile {
            &self.profile
        }

        async fn respond(
            &self,
            _request: &ResponderRequest,
            _timeout: Duration,
        ) -> Result<ResponderPayload, ResponderError> {
            Err(ResponderError::Agent("connection refused".to_string()))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_responder_without_self_check_keeps_its_status() {
        let monitor = Arc::new(HealthMonitor::new(
            HealthPolicy::default(),
            [ResponderId::from("dead")],
        ));
        let dead = ResponderId::from("dead");
        for _ in 0..3 {
            monitor.record(&dead, ObservedOutcome::Error, Duration::from_millis(5));
        }
        let updated_at = monitor.summary().updated_at;
        let events = monitor.events().len();

        let cancel = CancellationToken::new();
        let responders: Vec<Arc<dyn AgentResponder>> = vec![Arc::new(Dead {
            profile: ResponderProfile::new("dead", "Dead"),
        })];
        let handle = spawn_health_probe(
            Arc::clone(&monitor),
            responders,
            Duration::from_secs(10),
            Duration::from_secs(1),
            cancel.clone(),
        );
        tokio::time::sleep(Duration::from_secs(65)).await;
        cancel.cancel();
        handle.await.unwrap();

        assert_eq!(monitor.status(&dead), Some(HealthStatus::Unhealthy));
        assert_eq!(monitor.summary().updated_at, updated_at);
        assert_eq!(monitor.events().len(), events);
    }
}
