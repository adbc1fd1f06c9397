//! Progress notification port
//!
//! Defines the interface for reporting progress during a deliberation.

use council_domain::{ConsensusRecord, DeliberationId, ResponderId, ResponseOutcome};

/// Callback for progress updates during a deliberation
///
/// Implementations live in the presentation layer and can display
/// progress in various ways (console, web UI, etc.)
pub trait DeliberationProgress: Send + Sync {
    /// Called when the fan-out starts
    fn on_dispatch_start(&self, deliberation_id: DeliberationId, responders: usize);

    /// Called as each responder's outcome is recorded
    fn on_responder_complete(&self, responder_id: &ResponderId, outcome: &ResponseOutcome);

    /// Called once the consensus record is available
    fn on_consensus(&self, _record: &ConsensusRecord) {}
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl DeliberationProgress for NoProgress {
    fn on_dispatch_start(&self, _deliberation_id: DeliberationId, _responders: usize) {}
    fn on_responder_complete(&self, _responder_id: &ResponderId, _outcome: &ResponseOutcome) {}
}
