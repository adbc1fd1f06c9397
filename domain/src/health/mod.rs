//! Responder health derivation

pub mod policy;
pub mod status;
pub mod summary;
pub mod window;

pub use policy::HealthPolicy;
pub use status::{HealthStatus, OverallHealth};
pub use summary::{HealthEvent, HealthSummary};
pub use window::{Observation, ObservedOutcome, OutcomeWindow};
