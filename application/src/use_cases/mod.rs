//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod access_deliberations;
pub mod deliberate;
pub mod dispatch;
