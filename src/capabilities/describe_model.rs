//! `describe_model` — describe one catalog model.
//!
//! Resolves the named model against the snapshot (case-insensitive, by name
//! or friendly name) and fails with `NotFound` on a miss — the name came
//! from the backend's argument extraction and may not exist.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::catalog::find_model;
use crate::error::AgentError;
use crate::llm::ChatMessage;

use super::{malformed_args, Capability, CapabilityContext, CapabilityResult, DEFAULT_MODEL};

#[derive(Debug, Deserialize)]
struct DescribeModelArgs {
    model: String,
}

pub struct DescribeModel;

#[async_trait]
impl Capability for DescribeModel {
    fn name(&self) -> &'static str {
        "describe_model"
    }

    fn description(&self) -> &'static str {
        "Describe one of the models available on the platform. Use when the \
         user asks what a specific model is or what it is good at."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "model": {
                    "type": "string",
                    "description": "The model the user is asking about"
                }
            },
            "required": ["model"]
        })
    }

    async fn execute(
        &self,
        ctx: &CapabilityContext<'_>,
        args: Value,
    ) -> Result<CapabilityResult, AgentError> {
        let args: DescribeModelArgs = serde_json::from_value(args).map_err(malformed_args)?;

        let entry = find_model(ctx.catalog, &args.model)
            .ok_or_else(|| AgentError::NotFound(args.model.clone()))?;

        let mut messages = vec![ChatMessage::system(format!(
            "The user is asking about the model \"{}\" ({}), published by {} on the \
             {} registry. Describe it to the user based on this summary:\n{}",
            entry.friendly_name,
            entry.name,
            entry.publisher,
            entry.registry,
            entry.description.as_deref().unwrap_or(&entry.summary),
        ))];
        messages.extend_from_slice(ctx.conversation);

        Ok(CapabilityResult {
            target_model: DEFAULT_MODEL.into(),
            messages,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogEntry;

    fn catalog() -> Vec<CatalogEntry> {
        vec![CatalogEntry {
            id: "gpt-4o".to_string(),
            name: "gpt-4o".to_string(),
            friendly_name: "GPT 4o".to_string(),
            publisher: "OpenAI".to_string(),
            registry: "azure-openai".to_string(),
            summary: "Flagship multimodal model.".to_string(),
            description: None,
            task: None,
            tags: Vec::new(),
        }]
    }

    #[tokio::test]
    async fn embeds_catalog_metadata_and_appends_conversation() {
        let catalog = catalog();
        let conversation = vec![ChatMessage::user("what is gpt-4o?")];
        let ctx = CapabilityContext {
            conversation: &conversation,
            catalog: &catalog,
        };

        let result = DescribeModel
            .execute(&ctx, json!({"model": "gpt-4o"}))
            .await
            .unwrap();

        assert_eq!(result.target_model, DEFAULT_MODEL);
        assert!(result.messages[0].content.contains("GPT 4o"));
        assert!(result.messages[0].content.contains("OpenAI"));
        assert!(result.messages[0]
            .content
            .contains("Flagship multimodal model."));
        assert_eq!(result.messages.last().unwrap(), &conversation[0]);
    }

    #[tokio::test]
    async fn resolves_case_insensitively() {
        let catalog = catalog();
        let ctx = CapabilityContext {
            conversation: &[],
            catalog: &catalog,
        };
        let result = DescribeModel
            .execute(&ctx, json!({"model": "GPT-4O"}))
            .await
            .unwrap();
        assert!(result.messages[0].content.contains("gpt-4o"));
    }

    #[tokio::test]
    async fn unknown_model_is_not_found() {
        let catalog = catalog();
        let ctx = CapabilityContext {
            conversation: &[],
            catalog: &catalog,
        };
        let err = DescribeModel
            .execute(&ctx, json!({"model": "llama-2"}))
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::NotFound(name) if name == "llama-2"));
    }

    #[tokio::test]
    async fn wrong_argument_shape_is_malformed() {
        let catalog = catalog();
        let ctx = CapabilityContext {
            conversation: &[],
            catalog: &catalog,
        };
        let err = DescribeModel
            .execute(&ctx, json!({"model": 42}))
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::MalformedArguments(_)));
    }
}
