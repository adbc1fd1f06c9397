//! Deliberate use case
//!
//! Orchestrates one deliberation end to end: validate, create, select
//! eligible responders, dispatch, reduce to consensus, build the evidence
//! trail, then persist everything as one unit and return the result.

use crate::config::CouncilParams;
use crate::ports::audit_logger::{AuditAction, AuditEvent, AuditLogger, NoAuditLogger};
use crate::ports::deliberation_repository::{DeliberationRepository, RepositoryError};
use crate::ports::progress::{DeliberationProgress, NoProgress};
use crate::use_cases::dispatch::Dispatcher;
use council_domain::{
    AgentResponse, ConsensusEngine, ConsensusRecord, Deliberation, DeliberationOptions,
    DeliberationResult, DomainError, EvidenceTrail, Query, RequesterId, ResponderRequest,
    TrustWeights, build_evidence_trail,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Errors that can occur during a deliberation
///
/// `no_consensus` and `insufficient_responses` are valid outcomes and never
/// surface here.
#[derive(Error, Debug)]
pub enum DeliberateError {
    #[error("Invalid request: {0}")]
    InvalidRequest(#[source] DomainError),

    /// Writes failed after all retries; the computed result, if any, is
    /// attached so no work is lost
    #[error("Persistence failed: {source}")]
    Persistence {
        #[source]
        source: RepositoryError,
        result: Option<Box<DeliberationResult>>,
    },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DeliberateError {
    /// The result computed before the error, if any
    pub fn result(&self) -> Option<&DeliberationResult> {
        match self {
            DeliberateError::Persistence { result, .. } => result.as_deref(),
            _ => None,
        }
    }
}

/// Input for the Deliberate use case
#[derive(Debug, Clone)]
pub struct DeliberateInput {
    pub query: String,
    pub requester_id: RequesterId,
    pub options: DeliberationOptions,
    /// Cancelling stops in-flight responder calls
    pub cancel: CancellationToken,
}

impl DeliberateInput {
    pub fn new(query: impl Into<String>, requester_id: impl Into<RequesterId>) -> Self {
        Self {
            query: query.into(),
            requester_id: requester_id.into(),
            options: DeliberationOptions::default(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_options(mut self, options: DeliberationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }
}

/// Use case for running a deliberation
pub struct DeliberateUseCase<R: DeliberationRepository + 'static> {
    repository: Arc<R>,
    dispatcher: Dispatcher,
    engine: ConsensusEngine,
    params: CouncilParams,
    audit: Arc<dyn AuditLogger>,
}

impl<R: DeliberationRepository + 'static> DeliberateUseCase<R> {
    pub fn new(repository: Arc<R>, dispatcher: Dispatcher, params: CouncilParams) -> Self {
        let engine = ConsensusEngine::new()
            .with_claim_match_ratio(params.claim_match_ratio)
            .with_min_participants(params.min_participants);
        Self {
            repository,
            dispatcher,
            engine,
            params,
            audit: Arc::new(NoAuditLogger),
        }
    }

    pub fn with_trust_weights(mut self, weights: TrustWeights) -> Self {
        self.engine = self.engine.with_weights(weights);
        self
    }

    pub fn with_audit_logger(mut self, audit: Arc<dyn AuditLogger>) -> Self {
        self.audit = audit;
        self
    }

    pub fn params(&self) -> &CouncilParams {
        &self.params
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Execute the use case with default (no-op) progress
    pub async fn execute(
        &self,
        input: DeliberateInput,
    ) -> Result<DeliberationResult, DeliberateError> {
        self.execute_with_progress(input, &NoProgress).await
    }

    /// Execute the use case with progress callbacks
    pub async fn execute_with_progress(
        &self,
        input: DeliberateInput,
        progress: &dyn DeliberationProgress,
    ) -> Result<DeliberationResult, DeliberateError> {
        let started = Instant::now();
        let query = Query::new(input.query).map_err(DeliberateError::InvalidRequest)?;
        let threshold = input
            .options
            .resolve_threshold(self.params.consensus_threshold)
            .map_err(DeliberateError::InvalidRequest)?;

        let mut deliberation = Deliberation::new(query, input.requester_id, threshold);
        info!(
            "Deliberation {} created (threshold {})",
            deliberation.id, threshold
        );
        let created = &deliberation;
        if let Err(e) = self
            .with_retry("create deliberation", move || {
                self.repository.create_deliberation(created)
            })
            .await
        {
            return Err(DeliberateError::Persistence {
                source: e,
                result: None,
            });
        }

        let eligible = self.dispatcher.eligible();
        debug!(
            "Deliberation {}: {}/{} responders eligible",
            deliberation.id,
            eligible.len(),
            self.dispatcher.responders().len()
        );

        deliberation
            .start()
            .map_err(|e| DeliberateError::Internal(e.to_string()))?;
        let started_state = &deliberation;
        if let Err(e) = self
            .with_retry("start deliberation", move || {
                self.repository.update_deliberation_status(started_state)
            })
            .await
        {
            let failed = self
                .mark_failed(deliberation, Vec::new(), &e.to_string())
                .await;
            return Err(DeliberateError::Persistence {
                source: e,
                result: Some(Box::new(failed)),
            });
        }

        let mut request = ResponderRequest::new(deliberation.id, deliberation.query.clone())
            .with_context(input.options.context.clone());
        if let Some(locale) = &input.options.locale {
            request = request.with_locale(locale.clone());
        }
        let outcome = self
            .dispatcher
            .dispatch(&request, &eligible, &input.cancel, progress)
            .await;
        let responses = outcome.responses;

        let record = if outcome.insufficient {
            let successful: Vec<&AgentResponse> =
                responses.iter().filter(|r| r.is_success()).collect();
            let lone = match successful.as_slice() {
                [only] => Some(*only),
                _ => None,
            };
            ConsensusRecord::insufficient(deliberation.id, threshold, lone)
        } else {
            match self.engine.evaluate(deliberation.id, threshold, &responses) {
                Ok(record) => record,
                Err(e) => return Err(self.internal(deliberation, responses, e).await),
            }
        };
        progress.on_consensus(&record);

        let trail = match build_evidence_trail(&record, &responses) {
            Ok(trail) => trail,
            Err(e) => return Err(self.internal(deliberation, responses, e).await),
        };

        if let Err(e) = deliberation
            .record_consensus(&record)
            .and_then(|_| deliberation.complete())
        {
            return Err(self.internal(deliberation, responses, e).await);
        }

        if let Err(e) = self
            .persist_final(&deliberation, &responses, &record, &trail)
            .await
        {
            error!(
                "Deliberation {}: persistence failed after {} attempts: {}",
                deliberation.id, self.params.persist_attempts, e
            );
            let result = DeliberationResult {
                deliberation,
                consensus_record: Some(record),
                evidence_trail: Some(trail),
                agent_responses: responses,
            };
            return Err(DeliberateError::Persistence {
                source: e,
                result: Some(Box::new(result)),
            });
        }

        let elapsed = started.elapsed();
        info!(
            "Deliberation {} completed: {} (agreement {:.2}, confidence {:.1}) in {}ms",
            deliberation.id,
            record.disposition,
            record.agreement_fraction,
            record.confidence_score,
            elapsed.as_millis()
        );
        self.audit.log(
            AuditEvent::new(
                AuditAction::Query,
                json!({
                    "query_hash": deliberation.query_hash,
                    "query_length": deliberation.query.text().chars().count(),
                    "responder_count": responses.len(),
                    "successful_responses": responses.iter().filter(|r| r.is_success()).count(),
                    "disposition": record.disposition,
                    "agreement_fraction": record.agreement_fraction,
                    "confidence_score": record.confidence_score,
                    "duration_ms": elapsed.as_millis() as u64,
                }),
            )
            .for_deliberation(deliberation.id)
            .by(deliberation.requester_id.clone()),
        );

        Ok(DeliberationResult {
            deliberation,
            consensus_record: Some(record),
            evidence_trail: Some(trail),
            agent_responses: responses,
        })
    }

    /// Write responses, record, trail and terminal state as one unit
    async fn persist_final(
        &self,
        deliberation: &Deliberation,
        responses: &[AgentResponse],
        record: &ConsensusRecord,
        trail: &EvidenceTrail,
    ) -> Result<(), RepositoryError> {
        self.with_retry("persist deliberation", move || async move {
            let mut tx = self.repository.begin().await?;
            tx.save_agent_responses(responses).await?;
            tx.save_consensus_record(record).await?;
            tx.save_evidence_trail(trail).await?;
            tx.update_deliberation_status(deliberation).await?;
            tx.commit().await
        })
        .await
    }

    /// Retry transient repository failures with doubling backoff
    async fn with_retry<F, Fut>(&self, what: &str, mut op: F) -> Result<(), RepositoryError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<(), RepositoryError>>,
    {
        let attempts = self.params.persist_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(()) => return Ok(()),
                Err(e) if attempt < attempts && e.is_transient() => {
                    let backoff = self.params.backoff_for(attempt);
                    warn!(
                        "{} failed (attempt {}/{}): {}; retrying in {}ms",
                        what,
                        attempt,
                        attempts,
                        e,
                        backoff.as_millis()
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn internal(
        &self,
        deliberation: Deliberation,
        responses: Vec<AgentResponse>,
        e: DomainError,
    ) -> DeliberateError {
        error!("Deliberation {}: {}", deliberation.id, e);
        self.mark_failed(deliberation, responses, &e.to_string()).await;
        DeliberateError::Internal(e.to_string())
    }

    /// Move to `failed` and store it, with any responses already
    /// collected, best effort
    async fn mark_failed(
        &self,
        mut deliberation: Deliberation,
        responses: Vec<AgentResponse>,
        message: &str,
    ) -> DeliberationResult {
        match deliberation.fail(message) {
            Ok(()) => {
                if let Err(e) = self.store_failed(&deliberation, &responses).await {
                    warn!(
                        "Deliberation {}: could not store failed status: {}",
                        deliberation.id, e
                    );
                }
            }
            Err(e) => warn!("Deliberation {}: {}", deliberation.id, e),
        }
        DeliberationResult {
            deliberation,
            consensus_record: None,
            evidence_trail: None,
            agent_responses: responses,
        }
    }

    async fn store_failed(
        &self,
        deliberation: &Deliberation,
        responses: &[AgentResponse],
    ) -> Result<(), RepositoryError> {
        if responses.is_empty() {
            return self.repository.update_deliberation_status(deliberation).await;
        }
        let mut tx = self.repository.begin().await?;
        tx.save_agent_responses(responses).await?;
        tx.update_deliberation_status(deliberation).await?;
        tx.commit().await
    }
}
