//! Deliberation repository port
//!
//! The coordinator writes the final state of a deliberation through a
//! [`DeliberationTransaction`] so that responses, consensus record,
//! evidence trail and terminal status become visible together or not at
//! all. Reads are not access-scoped here: callers check ownership.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use council_domain::{
    AgentResponse, ConsensusRecord, Deliberation, DeliberationFlag, DeliberationId,
    DeliberationResult, DeliberationStatus, EvidenceTrail, RequesterId,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur during repository operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RepositoryError {
    #[error("Deliberation not found: {0}")]
    NotFound(DeliberationId),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Repository unavailable: {0}")]
    Unavailable(String),
}

impl RepositoryError {
    /// Whether retrying the same write may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, RepositoryError::Unavailable(_))
    }
}

/// Default page size for listings
pub const DEFAULT_LIST_LIMIT: usize = 20;
/// Largest page a caller may request
pub const MAX_LIST_LIMIT: usize = 100;

/// Filters for [`DeliberationRepository::list_deliberations`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListFilter {
    /// Matches either the lifecycle status or the recorded disposition
    pub status: Option<DeliberationStatus>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub flagged: Option<bool>,
    pub limit: usize,
    pub offset: usize,
}

impl Default for ListFilter {
    fn default() -> Self {
        Self {
            status: None,
            from: None,
            to: None,
            flagged: None,
            limit: DEFAULT_LIST_LIMIT,
            offset: 0,
        }
    }
}

impl ListFilter {
    pub fn with_status(mut self, status: DeliberationStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_range(mut self, from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Self {
        self.from = from;
        self.to = to;
        self
    }

    pub fn with_flagged(mut self, flagged: bool) -> Self {
        self.flagged = Some(flagged);
        self
    }

    /// Page bounds; a zero limit falls back to the default
    pub fn with_page(mut self, limit: usize, offset: usize) -> Self {
        self.limit = match limit {
            0 => DEFAULT_LIST_LIMIT,
            n => n.min(MAX_LIST_LIMIT),
        };
        self.offset = offset;
        self
    }

    /// Whether `deliberation` passes every filter except `flagged`
    pub fn matches(&self, deliberation: &Deliberation) -> bool {
        if let Some(status) = self.status {
            let by_disposition = deliberation
                .disposition()
                .is_some_and(|d| DeliberationStatus::from(d) == status);
            if deliberation.status() != status && !by_disposition {
                return false;
            }
        }
        if self.from.is_some_and(|from| deliberation.created_at < from) {
            return false;
        }
        if self.to.is_some_and(|to| deliberation.created_at > to) {
            return false;
        }
        true
    }
}

/// One page of a listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliberationPage {
    pub items: Vec<Deliberation>,
    /// Matches before pagination
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
}

/// Durable store of deliberations
#[async_trait]
pub trait DeliberationRepository: Send + Sync {
    async fn create_deliberation(&self, deliberation: &Deliberation)
    -> Result<(), RepositoryError>;

    async fn update_deliberation_status(
        &self,
        deliberation: &Deliberation,
    ) -> Result<(), RepositoryError>;

    /// Open a unit of work for the final persist step
    async fn begin(&self) -> Result<Box<dyn DeliberationTransaction>, RepositoryError>;

    async fn get_deliberation(&self, id: DeliberationId) -> Result<Deliberation, RepositoryError>;

    async fn get_deliberation_with_responses(
        &self,
        id: DeliberationId,
    ) -> Result<DeliberationResult, RepositoryError>;

    /// `Ok(None)` when the deliberation exists but has no trail yet
    async fn get_evidence_trail(
        &self,
        id: DeliberationId,
    ) -> Result<Option<EvidenceTrail>, RepositoryError>;

    /// Newest first; non-admin requesters only see their own deliberations
    async fn list_deliberations(
        &self,
        requester_id: &RequesterId,
        is_admin: bool,
        filter: &ListFilter,
    ) -> Result<DeliberationPage, RepositoryError>;

    async fn flag_deliberation(&self, flag: &DeliberationFlag) -> Result<(), RepositoryError>;
}

/// Buffered writes applied atomically on [`commit`](Self::commit)
///
/// Dropping a transaction without committing discards its writes.
#[async_trait]
pub trait DeliberationTransaction: Send {
    async fn save_agent_responses(
        &mut self,
        responses: &[AgentResponse],
    ) -> Result<(), RepositoryError>;

    async fn save_consensus_record(
        &mut self,
        record: &ConsensusRecord,
    ) -> Result<(), RepositoryError>;

    async fn save_evidence_trail(&mut self, trail: &EvidenceTrail) -> Result<(), RepositoryError>;

    async fn update_deliberation_status(
        &mut self,
        deliberation: &Deliberation,
    ) -> Result<(), RepositoryError>;

    async fn commit(self: Box<Self>) -> Result<(), RepositoryError>;
}
