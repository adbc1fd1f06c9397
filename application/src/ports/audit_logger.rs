//! Port for structured audit logging.
//!
//! Defines the [`AuditLogger`] trait for recording who asked what, who read
//! which deliberation, flags raised for review and responder health
//! transitions.
//!
//! This is separate from `tracing`-based operation logs: tracing handles
//! human-readable diagnostic messages, while this port captures an audit
//! record in a machine-readable format (JSONL).

use council_domain::{DeliberationId, RequesterId};
use serde_json::Value;

/// Audited action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    Query,
    Access,
    Flag,
    HealthTransition,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Query => "query",
            AuditAction::Access => "access",
            AuditAction::Flag => "flag",
            AuditAction::HealthTransition => "health_transition",
        }
    }
}

/// A structured audit event.
pub struct AuditEvent {
    pub action: AuditAction,
    pub deliberation_id: Option<DeliberationId>,
    pub requester_id: Option<RequesterId>,
    /// JSON payload with action-specific data.
    pub payload: Value,
}

impl AuditEvent {
    pub fn new(action: AuditAction, payload: Value) -> Self {
        Self {
            action,
            deliberation_id: None,
            requester_id: None,
            payload,
        }
    }

    pub fn for_deliberation(mut self, id: DeliberationId) -> Self {
        self.deliberation_id = Some(id);
        self
    }

    pub fn by(mut self, requester: RequesterId) -> Self {
        self.requester_id = Some(requester);
        self
    }
}

/// Port for logging audit events.
///
/// The `log` method is synchronous and non-fallible so that audit
/// failures never disrupt a deliberation.
pub trait AuditLogger: Send + Sync {
    fn log(&self, event: AuditEvent);
}

/// No-op implementation for tests and when auditing is disabled.
pub struct NoAuditLogger;

impl AuditLogger for NoAuditLogger {
    fn log(&self, _event: AuditEvent) {}
}
