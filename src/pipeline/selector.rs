//! Selector: resolve natural-language intent into at most one capability
//! invocation, or none.
//!
//! One non-streaming round-trip. The conversation goes to the backend
//! prefixed by a single synthesized system message that embeds the catalog
//! snapshot; the registry's schemas are offered with automatic tool choice.

use std::time::Instant;

use crate::capabilities::CapabilityRegistry;
use crate::catalog::{summaries, CatalogEntry};
use crate::error::AgentError;
use crate::llm::{ChatBackend, ChatMessage, ChatRequest};

/// Model used for the tool-selection round-trip.
pub const SELECTOR_MODEL: &str = "gpt-4o";

/// The selector's output: the backend's chosen capability, arguments still
/// raw. Parsing happens in the executor.
#[derive(Debug, Clone)]
pub struct CapabilityInvocation {
    pub name: String,
    pub raw_arguments: String,
}

pub struct Selector<'a> {
    backend: &'a dyn ChatBackend,
    registry: &'a CapabilityRegistry,
}

impl<'a> Selector<'a> {
    pub fn new(backend: &'a dyn ChatBackend, registry: &'a CapabilityRegistry) -> Self {
        Self { backend, registry }
    }

    /// Ask the backend to pick at most one capability for this turn.
    ///
    /// Returns `None` when no tool was chosen — the caller falls back to
    /// streaming the original conversation. If the backend offers several
    /// tool calls, only the first is honored; the rest are discarded.
    pub async fn select(
        &self,
        token: &str,
        catalog: &[CatalogEntry],
        conversation: &[ChatMessage],
    ) -> Result<Option<CapabilityInvocation>, AgentError> {
        let mut messages = Vec::with_capacity(conversation.len() + 1);
        messages.push(build_preamble(catalog)?);
        messages.extend_from_slice(conversation);

        let request = ChatRequest {
            model: SELECTOR_MODEL.into(),
            messages,
            stream: false,
            tools: Some(self.registry.tool_definitions()),
            tool_choice: Some("auto".into()),
            stream_options: None,
        };

        let started = Instant::now();
        let completion = self.backend.complete(token, &request).await?;
        log::debug!(
            "tool selection took {}ms",
            started.elapsed().as_millis()
        );

        let Some(choice) = completion.choices.into_iter().next() else {
            return Ok(None);
        };
        let Some(mut calls) = choice.message.tool_calls else {
            return Ok(None);
        };
        if calls.is_empty() {
            return Ok(None);
        }
        if calls.len() > 1 {
            log::debug!("backend offered {} tool calls; honoring the first", calls.len());
        }

        let first = calls.swap_remove(0);
        Ok(Some(CapabilityInvocation {
            name: first.function.name,
            raw_arguments: first.function.arguments,
        }))
    }
}

/// The system preamble: introduces the service and embeds the JSON-encoded
/// model summaries so the backend can ground its tool arguments.
fn build_preamble(catalog: &[CatalogEntry]) -> Result<ChatMessage, AgentError> {
    let listing = serde_json::to_string(&summaries(catalog))
        .map_err(|e| AgentError::Execution(e.to_string()))?;
    Ok(ChatMessage::system(format!(
        "You help users work with the models available on this platform. \
         The available models are:\n{}\nIf the user's request matches one of \
         the provided functions, call it. Otherwise answer directly.",
        listing
    )))
}
