//! Shared state for the HTTP handlers

use super::auth::PolicyEngine;
use council_application::{
    AccessDeliberationsUseCase, DeliberateUseCase, DeliberationRepository, HealthMonitor,
};
use std::sync::Arc;

pub struct AppState<R: DeliberationRepository + 'static> {
    pub deliberate: Arc<DeliberateUseCase<R>>,
    pub access: Arc<AccessDeliberationsUseCase<R>>,
    pub monitor: Arc<HealthMonitor>,
    pub policy: Arc<dyn PolicyEngine>,
}

impl<R: DeliberationRepository + 'static> AppState<R> {
    pub fn new(
        deliberate: DeliberateUseCase<R>,
        access: AccessDeliberationsUseCase<R>,
        monitor: Arc<HealthMonitor>,
        policy: Arc<dyn PolicyEngine>,
    ) -> Self {
        Self {
            deliberate: Arc::new(deliberate),
            access: Arc::new(access),
            monitor,
            policy,
        }
    }
}

// Derived Clone would require `R: Clone`.
impl<R: DeliberationRepository + 'static> Clone for AppState<R> {
    fn clone(&self) -> Self {
        Self {
            deliberate: Arc::clone(&self.deliberate),
            access: Arc::clone(&self.access),
            monitor: Arc::clone(&self.monitor),
            policy: Arc::clone(&self.policy),
        }
    }
}
