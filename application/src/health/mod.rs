//! Responder health tracking

pub mod monitor;
pub mod probe;

pub use monitor::{HealthMonitor, MAX_HEALTH_EVENTS};
pub use probe::spawn_health_probe;
