//! Application-level configuration.
//!
//! - [`CouncilParams`]: deliberation control (threshold, timeouts, retries)

pub mod council_params;

pub use council_params::CouncilParams;
