//! `list_models` — recite the catalog.
//!
//! Takes no arguments. The downstream model is constrained to present
//! exactly the snapshot's entries, so the answer never invents models.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::AgentError;
use crate::llm::ChatMessage;

use super::{Capability, CapabilityContext, CapabilityResult, DEFAULT_MODEL};

pub struct ListModels;

#[async_trait]
impl Capability for ListModels {
    fn name(&self) -> &'static str {
        "list_models"
    }

    fn description(&self) -> &'static str {
        "List the models available on the platform. Use when the user asks \
         what models exist or are available."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {},
            "required": []
        })
    }

    async fn execute(
        &self,
        ctx: &CapabilityContext<'_>,
        _args: Value,
    ) -> Result<CapabilityResult, AgentError> {
        let mut listing = String::new();
        for entry in ctx.catalog {
            listing.push_str(&format!(
                "- {} ({}), published by {}\n",
                entry.friendly_name, entry.name, entry.publisher
            ));
        }

        let mut messages = vec![ChatMessage::system(format!(
            "The user wants to know which models are available on the platform. \
             Present exactly the models below — all of them, and no others:\n{}",
            listing
        ))];
        messages.extend_from_slice(ctx.conversation);

        Ok(CapabilityResult {
            target_model: DEFAULT_MODEL.into(),
            messages,
        })
    }
}
