//! Dispatcher
//!
//! Runs one deliberation's fan-out. Every eligible responder is called as
//! an independent task bound by the per-agent timeout, and the whole
//! collection is bound by the overall deadline.
//!
//! - A call that exceeds its own timeout is recorded as timed out; an
//!   answer that lands after it is stale and discarded the same way.
//! - When the deadline passes, in-flight calls are aborted and recorded
//!   as timed out.
//! - When the caller cancels, in-flight calls are aborted and recorded as
//!   errored. Those calls are not reported to the health monitor, since
//!   they say nothing about the responder.
//!
//! Failures are always recorded, never dropped, and the dispatcher never
//! fails a deliberation itself.

use crate::config::CouncilParams;
use crate::health::HealthMonitor;
use crate::ports::agent_responder::{AgentResponder, ResponderError};
use crate::ports::progress::DeliberationProgress;
use council_domain::{
    AgentResponse, DeliberationId, ResponderId, ResponderPayload, ResponderRequest,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Message recorded for calls cut short by the caller
pub const CANCELLED_MESSAGE: &str = "deliberation cancelled";

/// Everything one fan-out produced
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    /// All recorded responses, in receipt order
    pub responses: Vec<AgentResponse>,
    pub eligible: usize,
    pub deadline_elapsed: bool,
    pub cancelled: bool,
    /// Too few eligible or successful responders to vote
    pub insufficient: bool,
}

impl DispatchOutcome {
    pub fn successful(&self) -> usize {
        self.responses.iter().filter(|r| r.is_success()).count()
    }
}

enum Call {
    Answered(Result<ResponderPayload, ResponderError>),
    TimedOut,
    Stale,
}

/// Fans a request out to the eligible responders
pub struct Dispatcher {
    responders: Vec<Arc<dyn AgentResponder>>,
    monitor: Arc<HealthMonitor>,
    agent_timeout: Duration,
    deadline: Duration,
    min_participants: usize,
}

impl Dispatcher {
    pub fn new(responders: Vec<Arc<dyn AgentResponder>>, monitor: Arc<HealthMonitor>) -> Self {
        Self::with_params(responders, monitor, &CouncilParams::default())
    }

    pub fn with_params(
        responders: Vec<Arc<dyn AgentResponder>>,
        monitor: Arc<HealthMonitor>,
        params: &CouncilParams,
    ) -> Self {
        Self {
            responders,
            monitor,
            agent_timeout: params.effective_agent_timeout(),
            deadline: params.deadline,
            min_participants: params.min_participants.max(1),
        }
    }

    /// Override both timeouts as given
    pub fn with_timeouts(mut self, agent_timeout: Duration, deadline: Duration) -> Self {
        self.agent_timeout = agent_timeout;
        self.deadline = deadline;
        self
    }

    pub fn responders(&self) -> &[Arc<dyn AgentResponder>] {
        &self.responders
    }

    pub fn monitor(&self) -> &Arc<HealthMonitor> {
        &self.monitor
    }

    /// Registered responders that may take part now
    ///
    /// Claims the trial slot of any unhealthy responder whose cooldown has
    /// passed, so call it once per deliberation.
    pub fn eligible(&self) -> Vec<Arc<dyn AgentResponder>> {
        self.responders
            .iter()
            .filter(|r| self.monitor.is_eligible(&r.profile().id))
            .cloned()
            .collect()
    }

    /// Call `eligible` concurrently and collect every outcome
    pub async fn dispatch(
        &self,
        request: &ResponderRequest,
        eligible: &[Arc<dyn AgentResponder>],
        cancel: &CancellationToken,
        progress: &dyn DeliberationProgress,
    ) -> DispatchOutcome {
        let deliberation_id = request.deliberation_id;
        progress.on_dispatch_start(deliberation_id, eligible.len());

        if eligible.is_empty() {
            warn!("Deliberation {}: no eligible responders", deliberation_id);
            return DispatchOutcome {
                responses: Vec::new(),
                eligible: 0,
                deadline_elapsed: false,
                cancelled: false,
                insufficient: true,
            };
        }

        info!(
            "Deliberation {}: dispatching to {} responders",
            deliberation_id,
            eligible.len()
        );

        let started = Instant::now();
        let deadline_at = started + self.deadline;
        let request = Arc::new(request.clone());
        let agent_timeout = self.agent_timeout;

        let mut join_set = JoinSet::new();
        let mut tasks: HashMap<tokio::task::Id, ResponderId> = HashMap::new();
        for responder in eligible {
            let responder = Arc::clone(responder);
            let request = Arc::clone(&request);
            let id = responder.profile().id.clone();
            let handle = join_set.spawn(async move {
                let called = Instant::now();
                let result =
                    tokio::time::timeout(agent_timeout, responder.respond(&request, agent_timeout))
                        .await;
                let latency = called.elapsed();
                let call = match result {
                    Ok(answer) if latency <= agent_timeout => Call::Answered(answer),
                    Ok(_) => Call::Stale,
                    Err(_) => Call::TimedOut,
                };
                (call, latency)
            });
            tasks.insert(handle.id(), id);
        }

        let mut responses: Vec<AgentResponse> = Vec::with_capacity(eligible.len());
        let mut sequence: u64 = 0;
        let mut deadline_elapsed = false;
        let mut cancelled = false;

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    cancelled = true;
                    break;
                }
                _ = tokio::time::sleep_until(deadline_at) => {
                    deadline_elapsed = true;
                    break;
                }
                joined = join_set.join_next_with_id() => {
                    let Some(joined) = joined else { break };
                    let response = match joined {
                        Ok((task, (call, latency))) => {
                            let Some(id) = tasks.remove(&task) else { continue };
                            to_response(deliberation_id, id, call, latency, sequence)
                        }
                        Err(e) => {
                            let Some(id) = tasks.remove(&e.id()) else { continue };
                            warn!("Responder {} task failed: {}", id, e);
                            AgentResponse::errored(
                                deliberation_id,
                                id,
                                format!("responder task failed: {e}"),
                                started.elapsed(),
                                sequence,
                            )
                        }
                    };
                    sequence += 1;
                    progress.on_responder_complete(&response.responder_id, &response.outcome);
                    responses.push(response);
                }
            }
        }

        join_set.abort_all();
        while join_set.join_next().await.is_some() {}

        let reported = responses.len();
        // unanswered calls in registration order, so sequences stay deterministic
        for responder in eligible {
            let id = &responder.profile().id;
            if !tasks.values().any(|pending| pending == id) {
                continue;
            }
            let response = if cancelled {
                AgentResponse::errored(
                    deliberation_id,
                    id.clone(),
                    CANCELLED_MESSAGE,
                    started.elapsed(),
                    sequence,
                )
            } else {
                warn!(
                    "Responder {} still running at deadline, counted as timed out",
                    id
                );
                AgentResponse::timed_out(deliberation_id, id.clone(), started.elapsed(), sequence)
            };
            sequence += 1;
            progress.on_responder_complete(&response.responder_id, &response.outcome);
            responses.push(response);
        }

        let health_scope = if cancelled { reported } else { responses.len() };
        for response in &responses[..health_scope] {
            self.monitor.record_response(response);
        }

        let successful = responses.iter().filter(|r| r.is_success()).count();
        let insufficient =
            eligible.len() < self.min_participants || successful < self.min_participants;
        info!(
            "Deliberation {}: {}/{} responders succeeded in {}ms{}",
            deliberation_id,
            successful,
            eligible.len(),
            started.elapsed().as_millis(),
            if insufficient { " (insufficient)" } else { "" }
        );

        DispatchOutcome {
            responses,
            eligible: eligible.len(),
            deadline_elapsed,
            cancelled,
            insufficient,
        }
    }
}

fn to_response(
    deliberation_id: DeliberationId,
    id: ResponderId,
    call: Call,
    latency: Duration,
    sequence: u64,
) -> AgentResponse {
    match call {
        Call::Answered(Ok(payload)) => match payload.validate() {
            Ok(()) => {
                debug!("Responder {} answered in {}ms", id, latency.as_millis());
                AgentResponse::succeeded(deliberation_id, id, payload, latency, sequence)
            }
            Err(e) => {
                warn!("Responder {} returned an invalid payload: {}", id, e);
                let error = ResponderError::InvalidResponse(e.to_string());
                AgentResponse::errored(deliberation_id, id, error.to_string(), latency, sequence)
            }
        },
        Call::Answered(Err(ResponderError::Timeout)) | Call::TimedOut => {
            warn!("Responder {} timed out after {}ms", id, latency.as_millis());
            AgentResponse::timed_out(deliberation_id, id, latency, sequence)
        }
        Call::Answered(Err(e)) => {
            warn!("Responder {} failed: {}", id, e);
            AgentResponse::errored(deliberation_id, id, e.to_string(), latency, sequence)
        }
        Call::Stale => {
            warn!(
                "Responder {} answered after its timeout ({}ms), discarded",
                id,
                latency.as_millis()
            );
            AgentResponse::timed_out(deliberation_id, id, latency, sequence)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::progress::NoProgress;
    use async_trait::async_trait;
    use council_domain::{
        HealthPolicy, HealthStatus, ObservedOutcome, Query, ResponderProfile, ResponseOutcome,
    };
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Responder that sleeps, then returns a fixed result
    struct ScriptedResponder {
        profile: ResponderProfile,
        delay: Duration,
        result: Result<ResponderPayload, ResponderError>,
    }

    impl ScriptedResponder {
        fn ok(id: &str, delay_secs: u64) -> Arc<dyn AgentResponder> {
            Arc::new(Self {
                profile: ResponderProfile::new(id, id.to_uppercase()),
                delay: Duration::from_secs(delay_secs),
                result: Ok(ResponderPayload::new(format!("{id} answer"), 80.0).with_claims(["A"])),
            })
        }

        fn failing(id: &str, error: ResponderError) -> Arc<dyn AgentResponder> {
            Arc::new(Self {
                profile: ResponderProfile::new(id, id.to_uppercase()),
                delay: Duration::from_millis(10),
                result: Err(error),
            })
        }

        fn returning(id: &str, payload: ResponderPayload) -> Arc<dyn AgentResponder> {
            Arc::new(Self {
                profile: ResponderProfile::new(id, id.to_uppercase()),
                delay: Duration::from_millis(10),
                result: Ok(payload),
            })
        }
    }

    #[async_trait]
    impl AgentResponder for ScriptedResponder {
        fn profile(&self) -> &ResponderProfile {
            &self.profile
        }

        async fn respond(
            &self,
            _request: &ResponderRequest,
            _timeout: Duration,
        ) -> Result<ResponderPayload, ResponderError> {
            tokio::time::sleep(self.delay).await;
            self.result.clone()
        }
    }

    /// Errors on its first `failures` calls, then answers
    struct FlakyResponder {
        profile: ResponderProfile,
        failures: usize,
        calls: AtomicUsize,
    }

    impl FlakyResponder {
        fn new(id: &str, failures: usize) -> Arc<Self> {
            Arc::new(Self {
                profile: ResponderProfile::new(id, id.to_uppercase()),
                failures,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AgentResponder for FlakyResponder {
        fn profile(&self) -> &ResponderProfile {
            &self.profile
        }

        async fn respond(
            &self,
            _request: &ResponderRequest,
            _timeout: Duration,
        ) -> Result<ResponderPayload, ResponderError> {
            tokio::time::sleep(Duration::from_millis(10)).await;
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err(ResponderError::Agent("connection reset".to_string()))
            } else {
                Ok(ResponderPayload::new("flaky answer", 70.0))
            }
        }
    }

    #[derive(Default)]
    struct RecordingProgress {
        completed: Mutex<Vec<String>>,
    }

    impl DeliberationProgress for RecordingProgress {
        fn on_dispatch_start(&self, _id: DeliberationId, _responders: usize) {}

        fn on_responder_complete(&self, responder_id: &ResponderId, outcome: &ResponseOutcome) {
            self.completed
                .lock()
                .unwrap()
                .push(format!("{}:{}", responder_id, outcome.as_str()));
        }
    }

    fn dispatcher(responders: Vec<Arc<dyn AgentResponder>>) -> Dispatcher {
        let ids: Vec<ResponderId> = responders.iter().map(|r| r.profile().id.clone()).collect();
        let monitor = Arc::new(HealthMonitor::new(HealthPolicy::default(), ids));
        Dispatcher::new(responders, monitor)
    }

    fn request() -> ResponderRequest {
        ResponderRequest::new(DeliberationId::new(), Query::new("How many beds?").unwrap())
    }

    #[tokio::test(start_paused = true)]
    async fn test_sequences_follow_receipt_order() {
        let d = dispatcher(vec![
            ScriptedResponder::ok("slow", 3),
            ScriptedResponder::ok("fast", 1),
            ScriptedResponder::ok("mid", 2),
        ]);
        let progress = RecordingProgress::default();
        let eligible = d.eligible();
        let outcome = d
            .dispatch(&request(), &eligible, &CancellationToken::new(), &progress)
            .await;

        let order: Vec<(&str, u64)> = outcome
            .responses
            .iter()
            .map(|r| (r.responder_id.as_str(), r.sequence))
            .collect();
        assert_eq!(order, vec![("fast", 0), ("mid", 1), ("slow", 2)]);
        assert!(!outcome.insufficient);
        assert_eq!(outcome.successful(), 3);
        assert_eq!(progress.completed.lock().unwrap().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_agent_timeout_records_timed_out() {
        let d = dispatcher(vec![
            ScriptedResponder::ok("a", 1),
            ScriptedResponder::ok("b", 2),
            ScriptedResponder::ok("sleepy", 30),
        ]);
        let eligible = d.eligible();
        let outcome = d
            .dispatch(&request(), &eligible, &CancellationToken::new(), &NoProgress)
            .await;

        assert_eq!(outcome.responses.len(), 3);
        let sleepy = outcome
            .responses
            .iter()
            .find(|r| r.responder_id.as_str() == "sleepy")
            .unwrap();
        assert_eq!(sleepy.outcome, ResponseOutcome::TimedOut);
        assert_eq!(sleepy.latency_ms, 10_000);
        assert!(!outcome.deadline_elapsed);
        assert!(!outcome.insufficient);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_aborts_in_flight_calls() {
        let d = dispatcher(vec![
            ScriptedResponder::ok("a", 1),
            ScriptedResponder::ok("b", 8),
            ScriptedResponder::ok("c", 9),
        ])
        .with_timeouts(Duration::from_secs(10), Duration::from_secs(5));
        let eligible = d.eligible();
        let started = Instant::now();
        let outcome = d
            .dispatch(&request(), &eligible, &CancellationToken::new(), &NoProgress)
            .await;

        assert!(started.elapsed() < Duration::from_secs(6));
        assert!(outcome.deadline_elapsed);
        assert!(outcome.insufficient);
        let outcomes: Vec<(&str, &str, u64)> = outcome
            .responses
            .iter()
            .map(|r| (r.responder_id.as_str(), r.outcome.as_str(), r.sequence))
            .collect();
        assert_eq!(
            outcomes,
            vec![
                ("a", "succeeded", 0),
                ("b", "timed_out", 1),
                ("c", "timed_out", 2)
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_before_any_reply_is_insufficient() {
        let d = dispatcher(vec![
            ScriptedResponder::ok("a", 5),
            ScriptedResponder::ok("b", 5),
        ]);
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            trigger.cancel();
        });

        let eligible = d.eligible();
        let outcome = d.dispatch(&request(), &eligible, &cancel, &NoProgress).await;

        assert!(outcome.cancelled);
        assert!(outcome.insufficient);
        assert_eq!(outcome.successful(), 0);
        assert!(outcome.responses.iter().all(|r| matches!(
            &r.outcome,
            ResponseOutcome::Errored { message } if message == CANCELLED_MESSAGE
        )));
        // caller cancellation says nothing about responder health
        assert!(d.monitor().summary().updated_at.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_are_recorded_and_reported() {
        let d = dispatcher(vec![
            ScriptedResponder::ok("good", 1),
            ScriptedResponder::failing("broken", ResponderError::Agent("503".to_string())),
            ScriptedResponder::returning("liar", ResponderPayload::new("", 50.0)),
            ScriptedResponder::failing("late", ResponderError::Timeout),
        ]);
        let eligible = d.eligible();
        let outcome = d
            .dispatch(&request(), &eligible, &CancellationToken::new(), &NoProgress)
            .await;

        assert_eq!(outcome.responses.len(), 4);
        assert_eq!(outcome.successful(), 1);
        assert!(outcome.insufficient);

        let by_id = |id: &str| {
            outcome
                .responses
                .iter()
                .find(|r| r.responder_id.as_str() == id)
                .unwrap()
                .outcome
                .as_str()
        };
        assert_eq!(by_id("broken"), "errored");
        assert_eq!(by_id("liar"), "errored");
        assert_eq!(by_id("late"), "timed_out");

        let summary = d.monitor().summary();
        assert_eq!(summary.statuses[&ResponderId::from("good")], HealthStatus::Healthy);
        assert_eq!(summary.statuses[&ResponderId::from("broken")], HealthStatus::Degraded);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unhealthy_responders_are_not_called() {
        let d = dispatcher(vec![
            ScriptedResponder::ok("a", 1),
            ScriptedResponder::ok("b", 1),
            ScriptedResponder::ok("down", 1),
        ]);
        let down = ResponderId::from("down");
        for _ in 0..3 {
            d.monitor()
                .record(&down, ObservedOutcome::Error, Duration::from_millis(1));
        }

        let eligible = d.eligible();
        assert_eq!(eligible.len(), 2);
        let outcome = d
            .dispatch(&request(), &eligible, &CancellationToken::new(), &NoProgress)
            .await;
        assert!(outcome.responses.iter().all(|r| r.responder_id != down));
        assert!(!outcome.insufficient);
    }

    async fn run_round(d: &Dispatcher) -> DispatchOutcome {
        let eligible = d.eligible();
        d.dispatch(&request(), &eligible, &CancellationToken::new(), &NoProgress)
            .await
    }

    #[tokio::test(start_paused = true)]
    async fn test_unhealthy_responder_recovers_through_dispatch() {
        let flaky = FlakyResponder::new("f", 3);
        let d = dispatcher(vec![
            ScriptedResponder::ok("a", 1),
            ScriptedResponder::ok("b", 1),
            flaky.clone() as Arc<dyn AgentResponder>,
        ]);
        let f = ResponderId::from("f");

        for _ in 0..3 {
            run_round(&d).await;
        }
        assert_eq!(d.monitor().status(&f), Some(HealthStatus::Unhealthy));
        assert_eq!(flaky.calls(), 3);

        // inside the cooldown it sits out
        let outcome = run_round(&d).await;
        assert!(outcome.responses.iter().all(|r| r.responder_id != f));
        assert_eq!(flaky.calls(), 3);

        for _ in 0..10 {
            tokio::time::advance(Duration::from_secs(600)).await;
            run_round(&d).await;
        }
        assert_eq!(flaky.calls(), 13);
        assert_eq!(d.monitor().status(&f), Some(HealthStatus::Healthy));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_trial_waits_for_another_cooldown() {
        let dead = FlakyResponder::new("dead", usize::MAX);
        let d = dispatcher(vec![
            ScriptedResponder::ok("a", 1),
            ScriptedResponder::ok("b", 1),
            dead.clone() as Arc<dyn AgentResponder>,
        ]);
        let id = ResponderId::from("dead");
        for _ in 0..3 {
            run_round(&d).await;
        }
        assert_eq!(d.monitor().status(&id), Some(HealthStatus::Unhealthy));

        tokio::time::advance(Duration::from_secs(31)).await;
        let outcome = run_round(&d).await;
        assert_eq!(outcome.eligible, 3);
        assert_eq!(dead.calls(), 4);
        assert_eq!(d.monitor().status(&id), Some(HealthStatus::Unhealthy));

        tokio::time::advance(Duration::from_secs(10)).await;
        assert_eq!(run_round(&d).await.eligible, 2);
        assert_eq!(dead.calls(), 4);

        tokio::time::advance(Duration::from_secs(30)).await;
        assert_eq!(run_round(&d).await.eligible, 3);
        assert_eq!(dead.calls(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_eligible_is_insufficient() {
        let d = dispatcher(vec![ScriptedResponder::ok("only", 1)]);
        let eligible = d.eligible();
        let outcome = d
            .dispatch(&request(), &eligible, &CancellationToken::new(), &NoProgress)
            .await;
        assert_eq!(outcome.successful(), 1);
        assert!(outcome.insufficient);
    }

    #[tokio::test]
    async fn test_no_eligible_makes_no_calls() {
        let d = dispatcher(Vec::new());
        let outcome = d
            .dispatch(&request(), &[], &CancellationToken::new(), &NoProgress)
            .await;
        assert!(outcome.responses.is_empty());
        assert!(outcome.insufficient);
    }
}
