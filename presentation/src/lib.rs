//! Presentation layer for council-engine
//!
//! This crate contains the CLI definition, console output formatters,
//! progress reporters and the HTTP API.

pub mod cli;
pub mod http;
pub mod output;
pub mod progress;

// Re-export commonly used types
pub use cli::commands::{Cli, Command, OutputFormat};
pub use http::{Action, ApiError, AppState, Caller, PolicyEngine, RolePolicy, router};
pub use output::{ConsoleFormatter, OutputFormatter};
pub use progress::reporter::{ProgressReporter, SimpleProgress};
