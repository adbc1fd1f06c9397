//! Infrastructure layer for council-engine
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer, including configuration file loading.

pub mod config;
pub mod logging;
pub mod persistence;
pub mod responders;

// Re-export commonly used types
pub use config::{
    ConfigLoader, ConfigValidationError, FileConfig, FileCouncilConfig, FileHealthConfig,
    FileLoggingConfig, FileResponderConfig, FileResponderKind, FileServerConfig, trust_weights,
};
pub use logging::JsonlAuditLogger;
pub use persistence::InMemoryDeliberationRepository;
pub use responders::{HttpResponder, RegistryError, ScriptedResponder, build_responders};
