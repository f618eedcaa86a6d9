//! `execute_model` — run an instruction against a named model.
//!
//! The simplest capability and the reference for the handler contract: a
//! pure rewrite with zero branching. The model name is accepted as given —
//! no catalog validation — and the instruction travels verbatim.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::AgentError;
use crate::llm::ChatMessage;

use super::{malformed_args, Capability, CapabilityContext, CapabilityResult};

#[derive(Debug, Deserialize)]
struct ExecuteModelArgs {
    model: String,
    instruction: String,
}

pub struct ExecuteModel;

#[async_trait]
impl Capability for ExecuteModel {
    fn name(&self) -> &'static str {
        "execute_model"
    }

    fn description(&self) -> &'static str {
        "Execute a specific model with the user's instruction. Use when the \
         user names a model and says what it should do."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "model": {
                    "type": "string",
                    "description": "The model to execute, exactly as the user referred to it"
                },
                "instruction": {
                    "type": "string",
                    "description": "The instruction to send to the model, verbatim"
                }
            },
            "required": ["model", "instruction"]
        })
    }

    async fn execute(
        &self,
        _ctx: &CapabilityContext<'_>,
        args: Value,
    ) -> Result<CapabilityResult, AgentError> {
        let args: ExecuteModelArgs = serde_json::from_value(args).map_err(malformed_args)?;

        Ok(CapabilityResult {
            messages: vec![
                ChatMessage::system(
                    "Begin your response by stating which model you are, then answer \
                     the user's instruction.",
                ),
                ChatMessage::user(args.instruction),
            ],
            target_model: args.model,
        })
    }
}
