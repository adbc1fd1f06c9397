//! Application layer for council-engine
//!
//! This crate contains use cases, port definitions, the health monitor and
//! application configuration. It depends only on the domain layer.

pub mod config;
pub mod health;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use config::CouncilParams;
pub use health::{HealthMonitor, spawn_health_probe};
pub use ports::{
    agent_responder::{AgentResponder, ResponderError},
    audit_logger::{AuditAction, AuditEvent, AuditLogger, NoAuditLogger},
    deliberation_repository::{
        DeliberationPage, DeliberationRepository, DeliberationTransaction, ListFilter,
        RepositoryError,
    },
    progress::{DeliberationProgress, NoProgress},
};
pub use use_cases::access_deliberations::{AccessDeliberationsUseCase, AccessError, Viewer};
pub use use_cases::deliberate::{DeliberateError, DeliberateInput, DeliberateUseCase};
pub use use_cases::dispatch::{DispatchOutcome, Dispatcher};
