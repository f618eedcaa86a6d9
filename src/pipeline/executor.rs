//! Capability executor: bridges the selector's output to a registry handler.
//!
//! The capability name and the raw argument text both came from the backend
//! and are treated as untrusted: unknown names and unparseable arguments
//! fail the request before anything streams.

use std::time::Instant;

use serde_json::Value;

use crate::capabilities::{CapabilityContext, CapabilityRegistry, CapabilityResult};
use crate::error::AgentError;

use super::selector::CapabilityInvocation;

pub struct Executor<'a> {
    registry: &'a CapabilityRegistry,
}

impl<'a> Executor<'a> {
    pub fn new(registry: &'a CapabilityRegistry) -> Self {
        Self { registry }
    }

    /// Look up, parse, invoke, and validate the handler's output.
    ///
    /// Handler errors (`NotFound`, `Execution`, ...) propagate unchanged.
    pub async fn execute(
        &self,
        ctx: &CapabilityContext<'_>,
        invocation: &CapabilityInvocation,
    ) -> Result<CapabilityResult, AgentError> {
        let capability = self
            .registry
            .lookup(&invocation.name)
            .ok_or_else(|| AgentError::UnknownCapability(invocation.name.clone()))?;

        let args: Value = serde_json::from_str(&invocation.raw_arguments)
            .map_err(|e| AgentError::MalformedArguments(e.to_string()))?;

        let started = Instant::now();
        let result = capability.execute(ctx, args).await?;
        log::debug!(
            "capability '{}' executed in {}ms",
            invocation.name,
            started.elapsed().as_millis()
        );

        if result.messages.is_empty() {
            return Err(AgentError::Execution(format!(
                "capability '{}' produced no messages",
                invocation.name
            )));
        }
        if result.messages.iter().any(|m| m.content.is_empty()) {
            return Err(AgentError::Execution(format!(
                "capability '{}' produced a message with no content",
                invocation.name
            )));
        }
        Ok(result)
    }
}
