//! Ports (interfaces) for external dependencies
//!
//! These traits define how the application layer interacts with
//! responders, storage, progress reporting and the audit log.
//! Implementations (adapters) are in the infrastructure and presentation
//! layers.

pub mod agent_responder;
pub mod audit_logger;
pub mod deliberation_repository;
pub mod progress;
