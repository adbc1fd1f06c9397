//! Deliberation aggregate
//!
//! A [`Deliberation`] owns its [`AgentResponse`]s and, once adjudicated,
//! exactly one consensus record and one evidence trail.

pub mod entities;
pub mod flag;
pub mod options;
pub mod response;
pub mod result;
pub mod status;
pub mod threshold;

pub use entities::Deliberation;
pub use flag::{DeliberationFlag, FlagRequest, FlagSeverity, HallucinationKind};
pub use options::DeliberationOptions;
pub use response::{AgentResponse, ResponseOutcome};
pub use result::DeliberationResult;
pub use status::DeliberationStatus;
pub use threshold::ConsensusThreshold;
