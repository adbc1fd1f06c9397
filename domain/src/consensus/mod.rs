//! Consensus computation over agent responses

pub mod claims;
pub mod cluster;
pub mod engine;
pub mod record;
pub mod weights;

pub use claims::{ClaimSet, DEFAULT_CLAIM_MATCH_RATIO, claims_equivalent, normalize_claim};
pub use engine::{ConsensusEngine, DEFAULT_MIN_PARTICIPANTS};
pub use record::{AgreementCluster, CONSENSUS_METHOD, ConsensusRecord, Disposition};
pub use weights::TrustWeights;
