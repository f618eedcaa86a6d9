//! # modeldesk
//!
//! A model-routing chat agent. One signed chat turn comes in; a
//! model-driven tool-selection round-trip decides whether it maps to one of
//! four capabilities (list models, describe a model, execute a model,
//! recommend a model); the matched capability — or the original
//! conversation, when none matches — feeds exactly one streaming completion
//! whose chunks relay to the caller as server-sent events.
//!
//! The service is stateless per request: the capability registry is built
//! once and shared read-only, and every credential arrives in request
//! headers.

pub mod auth;
pub mod capabilities;
pub mod catalog;
pub mod config;
pub mod error;
pub mod llm;
pub mod pipeline;
pub mod server;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::AgentError;

/// Crate version, reported by the health endpoint.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
