//! Domain layer for council-engine
//!
//! This crate contains the core business logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Deliberation
//!
//! A deliberation poses one query to several independent responders and
//! reduces their answers into one adjudicated result:
//!
//! - **Consensus**: responses are clustered by claim agreement and the
//!   heaviest cluster is weighed against the consensus threshold
//! - **Evidence trail**: each final claim is linked to the responses and
//!   sources that back it
//!
//! ## Health
//!
//! Each responder's recent outcomes decide whether it is healthy, degraded
//! or excluded from the next deliberation.

pub mod consensus;
pub mod core;
pub mod deliberation;
pub mod evidence;
pub mod health;
pub mod responder;

// Re-export commonly used types
pub use consensus::{
    AgreementCluster, ConsensusEngine, ConsensusRecord, Disposition, TrustWeights,
};
pub use core::{
    error::DomainError,
    ids::{DeliberationId, RequesterId, ResponderId, ResponseId},
    query::Query,
};
pub use deliberation::{
    AgentResponse, ConsensusThreshold, Deliberation, DeliberationFlag, DeliberationOptions,
    DeliberationResult, DeliberationStatus, FlagRequest, FlagSeverity, HallucinationKind,
    ResponseOutcome,
};
pub use evidence::{ClaimProvenance, EvidenceTrail, SupportingEvidence, build_evidence_trail};
pub use health::{
    HealthEvent, HealthPolicy, HealthStatus, HealthSummary, ObservedOutcome, OutcomeWindow,
    OverallHealth,
};
pub use responder::{EvidenceRef, ResponderPayload, ResponderProfile, ResponderRequest};
