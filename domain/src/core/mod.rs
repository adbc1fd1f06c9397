//! Core domain concepts shared across all subdomains.
//!
//! - [`ids`]: identifier value objects
//! - [`query::Query`]: a validated query to pose to the council
//! - [`error::DomainError`]: domain-level errors

pub mod error;
pub mod ids;
pub mod query;
