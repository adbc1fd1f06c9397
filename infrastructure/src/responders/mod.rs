//! Agent responder adapters
//!
//! - [`HttpResponder`]: remote agent over HTTP/JSON
//! - [`ScriptedResponder`]: fixed answer from config
//! - [`build_responders`]: builds the registered set at startup

mod http;
mod registry;
mod scripted;

pub use http::HttpResponder;
pub use registry::{RegistryError, build_responders};
pub use scripted::ScriptedResponder;
