//! Read and flag deliberations on behalf of a caller
//!
//! Ownership is enforced here, above the repository: non-admin callers
//! only see and flag their own deliberations. Every successful read and
//! flag is written to the audit log.

use crate::ports::audit_logger::{AuditAction, AuditEvent, AuditLogger, NoAuditLogger};
use crate::ports::deliberation_repository::{
    DeliberationPage, DeliberationRepository, ListFilter, RepositoryError,
};
use council_domain::{
    Deliberation, DeliberationFlag, DeliberationId, DeliberationResult, DomainError,
    EvidenceTrail, FlagRequest, RequesterId,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// The authenticated identity a read is performed for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewer {
    pub requester_id: RequesterId,
    pub is_admin: bool,
}

impl Viewer {
    pub fn new(requester_id: impl Into<RequesterId>, is_admin: bool) -> Self {
        Self {
            requester_id: requester_id.into(),
            is_admin,
        }
    }

    pub fn can_see(&self, deliberation: &Deliberation) -> bool {
        self.is_admin || deliberation.requester_id == self.requester_id
    }
}

#[derive(Error, Debug)]
pub enum AccessError {
    #[error("Deliberation not found: {0}")]
    NotFound(DeliberationId),

    #[error("Access to deliberation {0} is not allowed")]
    Forbidden(DeliberationId),

    #[error("Invalid request: {0}")]
    InvalidRequest(#[source] DomainError),

    #[error(transparent)]
    Repository(RepositoryError),
}

impl From<RepositoryError> for AccessError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::NotFound(id) => AccessError::NotFound(id),
            other => AccessError::Repository(other),
        }
    }
}

/// Use case for ownership-checked reads and flags
pub struct AccessDeliberationsUseCase<R: DeliberationRepository + 'static> {
    repository: Arc<R>,
    audit: Arc<dyn AuditLogger>,
}

impl<R: DeliberationRepository + 'static> AccessDeliberationsUseCase<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self {
            repository,
            audit: Arc::new(NoAuditLogger),
        }
    }

    pub fn with_audit_logger(mut self, audit: Arc<dyn AuditLogger>) -> Self {
        self.audit = audit;
        self
    }

    /// Full result of one deliberation
    pub async fn get(
        &self,
        viewer: &Viewer,
        id: DeliberationId,
    ) -> Result<DeliberationResult, AccessError> {
        let result = self.repository.get_deliberation_with_responses(id).await?;
        self.authorize(viewer, &result.deliberation)?;
        self.audit_access(viewer, id, "result");
        Ok(result)
    }

    /// Evidence trail only
    pub async fn evidence(
        &self,
        viewer: &Viewer,
        id: DeliberationId,
    ) -> Result<EvidenceTrail, AccessError> {
        let deliberation = self.repository.get_deliberation(id).await?;
        self.authorize(viewer, &deliberation)?;
        let trail = self
            .repository
            .get_evidence_trail(id)
            .await?
            .ok_or(AccessError::NotFound(id))?;
        self.audit_access(viewer, id, "evidence");
        Ok(trail)
    }

    /// One page of the deliberations this viewer may see
    pub async fn list(
        &self,
        viewer: &Viewer,
        filter: &ListFilter,
    ) -> Result<DeliberationPage, AccessError> {
        debug!(
            "Listing deliberations for {} (admin: {})",
            viewer.requester_id, viewer.is_admin
        );
        Ok(self
            .repository
            .list_deliberations(&viewer.requester_id, viewer.is_admin, filter)
            .await?)
    }

    /// Flag a deliberation for human review
    pub async fn flag(
        &self,
        viewer: &Viewer,
        id: DeliberationId,
        request: FlagRequest,
    ) -> Result<DeliberationFlag, AccessError> {
        request.validate().map_err(AccessError::InvalidRequest)?;
        let deliberation = self.repository.get_deliberation(id).await?;
        self.authorize(viewer, &deliberation)?;

        let flag = DeliberationFlag::new(id, viewer.requester_id.clone(), request);
        self.repository.flag_deliberation(&flag).await?;
        info!(
            "Deliberation {} flagged by {} ({:?}, {:?})",
            id, viewer.requester_id, flag.hallucination_kind, flag.severity
        );
        self.audit.log(
            AuditEvent::new(
                AuditAction::Flag,
                json!({
                    "reason": flag.reason,
                    "hallucination_type": flag.hallucination_kind,
                    "severity": flag.severity,
                }),
            )
            .for_deliberation(id)
            .by(viewer.requester_id.clone()),
        );
        Ok(flag)
    }

    fn authorize(&self, viewer: &Viewer, deliberation: &Deliberation) -> Result<(), AccessError> {
        if viewer.can_see(deliberation) {
            Ok(())
        } else {
            Err(AccessError::Forbidden(deliberation.id))
        }
    }

    fn audit_access(&self, viewer: &Viewer, id: DeliberationId, resource: &str) {
        self.audit.log(
            AuditEvent::new(
                AuditAction::Access,
                json!({ "resource": resource, "admin": viewer.is_admin }),
            )
            .for_deliberation(id)
            .by(viewer.requester_id.clone()),
        );
    }
}
