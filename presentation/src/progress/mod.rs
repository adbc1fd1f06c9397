//! Progress reporting while responders are consulted

pub mod reporter;

pub use reporter::{ProgressReporter, SimpleProgress};
