//! Capabilities: the named units of request-handling logic the selector can
//! pick via the backend's function-calling mechanism.
//!
//! Each capability rewrites the inbound conversation into a new message
//! sequence plus a target model; the completion streamer then makes exactly
//! one streaming call with that pair. Handlers run before any byte is
//! streamed, so a handler failure always maps to a clean error status.

mod describe_model;
mod execute_model;
mod list_models;
mod recommend_model;
mod registry;

pub use self::describe_model::DescribeModel;
pub use self::execute_model::ExecuteModel;
pub use self::list_models::ListModels;
pub use self::recommend_model::RecommendModel;
pub use self::registry::CapabilityRegistry;

use async_trait::async_trait;
use serde_json::Value;

use crate::catalog::CatalogEntry;
use crate::error::AgentError;
use crate::llm::ChatMessage;

/// Model used when no capability names a target: the fallback answer path
/// and every catalog-recital capability.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// What every capability hands back: a rewritten request for the completion
/// streamer.
#[derive(Debug, Clone)]
pub struct CapabilityResult {
    pub target_model: String,
    /// Non-empty, with no empty-content messages; enforced by the executor
    /// after every handler run.
    pub messages: Vec<ChatMessage>,
}

/// Per-request inputs shared by all handlers. The conversation is the
/// caller's original turn sequence; the catalog is this request's snapshot.
pub struct CapabilityContext<'a> {
    pub conversation: &'a [ChatMessage],
    pub catalog: &'a [CatalogEntry],
}

/// One selectable capability.
///
/// `parameters` is the JSON schema offered to the backend; `execute`
/// receives the arguments the backend chose, already parsed as JSON but not
/// yet validated against the schema — each handler deserializes its own
/// typed shape and reports a mismatch as `MalformedArguments`.
#[async_trait]
pub trait Capability: Send + Sync {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    fn parameters(&self) -> Value;

    async fn execute(
        &self,
        ctx: &CapabilityContext<'_>,
        args: Value,
    ) -> Result<CapabilityResult, AgentError>;
}

pub(crate) fn malformed_args(err: serde_json::Error) -> AgentError {
    AgentError::MalformedArguments(err.to_string())
}
