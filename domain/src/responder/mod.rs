//! Responder contract types
//!
//! Every agent taking part in a deliberation is an opaque responder. The
//! domain only knows its identity and the shape of what it returns.

pub mod payload;
pub mod profile;

pub use payload::{EvidenceRef, ResponderPayload, ResponderRequest};
pub use profile::ResponderProfile;
