//! Scripted fakes for the backend, catalog, and verifier seams.
//!
//! Test-only: compiled under `#[cfg(test)]` from the crate root and shared
//! by the pipeline and route tests.

use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::{json, Value};

use crate::auth::RequestVerifier;
use crate::catalog::{CatalogEntry, ModelCatalog};
use crate::error::AgentError;
use crate::llm::{ChatBackend, ChatCompletion, ChatRequest, ChunkStream};

/// A selector response with a plain answer and no tool calls.
pub fn no_tool_completion() -> Value {
    json!({"choices": [{"message": {"content": "hello there"}}]})
}

/// A selector response offering the given tool calls, in order.
pub fn tool_call_completion(calls: &[(&str, &str)]) -> Value {
    let tool_calls: Vec<Value> = calls
        .iter()
        .enumerate()
        .map(|(i, (name, arguments))| {
            json!({
                "id": format!("call_{}", i),
                "type": "function",
                "function": {"name": name, "arguments": arguments}
            })
        })
        .collect();
    json!({"choices": [{"message": {"content": null, "tool_calls": tool_calls}}]})
}

/// A small catalog snapshot shared across tests.
pub fn sample_catalog() -> Vec<CatalogEntry> {
    vec![
        CatalogEntry {
            id: "gpt-4o".to_string(),
            name: "gpt-4o".to_string(),
            friendly_name: "GPT 4o".to_string(),
            publisher: "OpenAI".to_string(),
            registry: "azure-openai".to_string(),
            summary: "Flagship multimodal model.".to_string(),
            description: None,
            task: None,
            tags: Vec::new(),
        },
        CatalogEntry {
            id: "phi-3-mini".to_string(),
            name: "phi-3-mini".to_string(),
            friendly_name: "Phi 3 Mini".to_string(),
            publisher: "Microsoft".to_string(),
            registry: "azure-ml".to_string(),
            summary: "Small, fast instruction model.".to_string(),
            description: None,
            task: None,
            tags: vec!["small".to_string()],
        },
    ]
}

/// `ChatBackend` that replays a fixed completion and a scripted chunk
/// stream, recording every request it sees.
pub struct ScriptedBackend {
    completion: Value,
    stream_items: Mutex<Option<Vec<Result<Bytes, AgentError>>>>,
    fail_open: bool,
    complete_requests: Mutex<Vec<ChatRequest>>,
    stream_requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedBackend {
    pub fn new(completion: Value) -> Self {
        Self {
            completion,
            stream_items: Mutex::new(Some(Vec::new())),
            fail_open: false,
            complete_requests: Mutex::new(Vec::new()),
            stream_requests: Mutex::new(Vec::new()),
        }
    }

    /// Script the chunk sequence the answer stream will yield.
    pub fn with_stream(self, items: Vec<Result<Bytes, AgentError>>) -> Self {
        *self.stream_items.lock().unwrap() = Some(items);
        self
    }

    /// Make `open_stream` fail before any chunk exists.
    pub fn with_open_failure(mut self) -> Self {
        self.fail_open = true;
        self
    }

    pub fn complete_requests(&self) -> Vec<ChatRequest> {
        self.complete_requests.lock().unwrap().clone()
    }

    pub fn stream_requests(&self) -> Vec<ChatRequest> {
        self.stream_requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatBackend for ScriptedBackend {
    async fn complete(
        &self,
        _token: &str,
        request: &ChatRequest,
    ) -> Result<ChatCompletion, AgentError> {
        self.complete_requests.lock().unwrap().push(request.clone());
        serde_json::from_value(self.completion.clone())
            .map_err(|e| AgentError::Backend(e.to_string()))
    }

    async fn open_stream(
        &self,
        _token: &str,
        request: &ChatRequest,
    ) -> Result<ChunkStream, AgentError> {
        self.stream_requests.lock().unwrap().push(request.clone());
        if self.fail_open {
            return Err(AgentError::Backend("stream open refused".into()));
        }
        let items = self
            .stream_items
            .lock()
            .unwrap()
            .take()
            .unwrap_or_default();
        Ok(Box::pin(futures::stream::iter(items)))
    }
}

/// `ModelCatalog` returning a fixed snapshot and counting fetches.
pub struct FixedCatalog {
    entries: Vec<CatalogEntry>,
    fetches: Mutex<usize>,
}

impl FixedCatalog {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self {
            entries,
            fetches: Mutex::new(0),
        }
    }

    pub fn fetches(&self) -> usize {
        *self.fetches.lock().unwrap()
    }
}

#[async_trait]
impl ModelCatalog for FixedCatalog {
    async fn snapshot(&self, _token: &str) -> Result<Vec<CatalogEntry>, AgentError> {
        *self.fetches.lock().unwrap() += 1;
        Ok(self.entries.clone())
    }
}

/// Verifier that accepts every signature.
pub struct AcceptAll;

#[async_trait]
impl RequestVerifier for AcceptAll {
    async fn verify(&self, _body: &[u8], _sig: &str, _key: &str) -> Result<(), AgentError> {
        Ok(())
    }
}

/// Verifier that rejects every signature.
pub struct RejectAll;

#[async_trait]
impl RequestVerifier for RejectAll {
    async fn verify(&self, _body: &[u8], _sig: &str, _key: &str) -> Result<(), AgentError> {
        Err(AgentError::Authentication("signature mismatch".into()))
    }
}
