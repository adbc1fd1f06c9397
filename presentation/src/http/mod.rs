//! HTTP API

pub mod auth;
pub mod dto;
pub mod error;
pub mod routes;
pub mod state;

pub use auth::{Action, Caller, PolicyEngine, RolePolicy};
pub use error::ApiError;
pub use routes::router;
pub use state::AppState;
