//! `recommend_model` — pick a best-fit model for a task.
//!
//! The cross-referencing is delegated: the full catalog snapshot and the
//! user's task both go into the system prompt, and the downstream model
//! picks one entry and justifies it.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::catalog::summaries;
use crate::error::AgentError;
use crate::llm::ChatMessage;

use super::{malformed_args, Capability, CapabilityContext, CapabilityResult, DEFAULT_MODEL};

#[derive(Debug, Deserialize)]
struct RecommendModelArgs {
    task: String,
}

pub struct RecommendModel;

#[async_trait]
impl Capability for RecommendModel {
    fn name(&self) -> &'static str {
        "recommend_model"
    }

    fn description(&self) -> &'static str {
        "Recommend the best available model for a task the user describes. \
         Use when the user asks which model they should use."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "task": {
                    "type": "string",
                    "description": "What the user wants to accomplish"
                }
            },
            "required": ["task"]
        })
    }

    async fn execute(
        &self,
        ctx: &CapabilityContext<'_>,
        args: Value,
    ) -> Result<CapabilityResult, AgentError> {
        let args: RecommendModelArgs = serde_json::from_value(args).map_err(malformed_args)?;

        let listing = serde_json::to_string(&summaries(ctx.catalog))
            .map_err(|e| AgentError::Execution(e.to_string()))?;

        let mut messages = vec![ChatMessage::system(format!(
            "The user wants a model recommendation for this task: {}\n\
             Pick the single best fit from the models below, name it, and \
             justify the choice. Recommend only models from this list:\n{}",
            args.task, listing
        ))];
        messages.extend_from_slice(ctx.conversation);

        Ok(CapabilityResult {
            target_model: DEFAULT_MODEL.into(),
            messages,
        })
    }
}
