//! Fixed, ordered registry of capabilities.
//!
//! Built once at startup and shared read-only across requests. Lookup is by
//! the stable string identifier the backend echoes in its tool call; an
//! unknown name is the caller's cue to fail the request, never to guess.

use std::sync::Arc;

use crate::llm::{ToolDefinition, ToolFunction};

use super::{Capability, DescribeModel, ExecuteModel, ListModels, RecommendModel};

pub struct CapabilityRegistry {
    capabilities: Vec<Arc<dyn Capability>>,
}

impl CapabilityRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            capabilities: Vec::new(),
        }
    }

    /// The production registry: the four standard capabilities, in the
    /// order they are offered to the backend.
    pub fn standard() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(ListModels));
        registry.register(Arc::new(DescribeModel));
        registry.register(Arc::new(ExecuteModel));
        registry.register(Arc::new(RecommendModel));
        registry
    }

    pub fn register(&mut self, capability: Arc<dyn Capability>) {
        self.capabilities.push(capability);
    }

    /// Resolve a capability by name. `None` for unknown names.
    pub fn lookup(&self, name: &str) -> Option<&Arc<dyn Capability>> {
        self.capabilities.iter().find(|c| c.name() == name)
    }

    /// Tool definitions for the selector call, in registration order.
    pub fn tool_definitions(&self) -> Vec<ToolDefinition> {
        self.capabilities
            .iter()
            .map(|c| ToolDefinition {
                kind: "function".into(),
                function: ToolFunction {
                    name: c.name().into(),
                    description: c.description().into(),
                    parameters: c.parameters(),
                },
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.capabilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }
}

impl Default for CapabilityRegistry {
    fn default() -> Self {
        Self::new()
    }
}
