//! Provenance of the final answer

pub mod builder;
pub mod trail;

pub use builder::build_evidence_trail;
pub use trail::{ClaimProvenance, EvidenceTrail, SupportingEvidence};
