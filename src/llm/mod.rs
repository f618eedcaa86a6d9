//! Chat-completion backend client and wire types.
//!
//! The platform speaks the OpenAI chat-completion dialect. Two call shapes
//! exist: a non-streaming call used by the selector to pick a capability,
//! and a streaming call that produces the caller-visible answer. Both carry
//! the caller's token as the bearer credential — the process holds no
//! credentials of its own.

pub mod sse;

use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::error::AgentError;
use self::sse::{SseEvent, SseSplitter};

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// Role of a conversation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

/// One turn of a conversation. Ordered sequences of these are chronological;
/// capabilities build new sequences, never mutate received ones in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Request wire types
// ---------------------------------------------------------------------------

/// Body of a `POST /chat/completions` call.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<ToolDefinition>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_choice: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream_options: Option<StreamOptions>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StreamOptions {
    pub include_usage: bool,
}

/// An offered tool, in the platform's function-calling shape.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    #[serde(rename = "type")]
    pub kind: String,
    pub function: ToolFunction,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolFunction {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

// ---------------------------------------------------------------------------
// Response wire types (non-streaming)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct ChatCompletion {
    pub choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
pub struct CompletionChoice {
    pub message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
pub struct CompletionMessage {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tool_calls: Option<Vec<ToolCall>>,
}

#[derive(Debug, Deserialize)]
pub struct ToolCall {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    pub function: ToolCallFunction,
}

#[derive(Debug, Deserialize)]
pub struct ToolCallFunction {
    pub name: String,
    /// Raw argument text; parsed downstream, never here.
    pub arguments: String,
}

// ---------------------------------------------------------------------------
// Backend seam
// ---------------------------------------------------------------------------

/// Ordered sequence of upstream chunk payloads (the JSON text of each
/// `data:` frame, `[DONE]` excluded).
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<Bytes, AgentError>> + Send>>;

/// The chat-completion backend, behind a trait so tests substitute a
/// scripted fake.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// One non-streaming completion round-trip.
    async fn complete(
        &self,
        token: &str,
        request: &ChatRequest,
    ) -> Result<ChatCompletion, AgentError>;

    /// Open a streaming completion. A transport or status failure here is
    /// still a clean error; nothing has been written to the caller yet.
    async fn open_stream(
        &self,
        token: &str,
        request: &ChatRequest,
    ) -> Result<ChunkStream, AgentError>;
}

// ---------------------------------------------------------------------------
// PlatformClient
// ---------------------------------------------------------------------------

/// `ChatBackend` over the platform's HTTP API.
pub struct PlatformClient {
    http: reqwest::Client,
    api_base: String,
}

impl PlatformClient {
    pub fn new(http: reqwest::Client, api_base: impl Into<String>) -> Self {
        Self {
            http,
            api_base: api_base.into(),
        }
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.api_base.trim_end_matches('/'))
    }

    async fn send(
        &self,
        token: &str,
        request: &ChatRequest,
    ) -> Result<reqwest::Response, AgentError> {
        let response = self
            .http
            .post(self.completions_url())
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", token))
            .json(request)
            .send()
            .await
            .map_err(|e| AgentError::Backend(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<no body>".to_string());
            log::debug!("completion call failed ({}): {}", status, body);
            return Err(AgentError::Backend(format!(
                "completion call failed with status {}",
                status
            )));
        }
        Ok(response)
    }
}

#[async_trait]
impl ChatBackend for PlatformClient {
    async fn complete(
        &self,
        token: &str,
        request: &ChatRequest,
    ) -> Result<ChatCompletion, AgentError> {
        log::debug!(
            "complete: model={}, messages={}, tools={:?}",
            request.model,
            request.messages.len(),
            request.tools.as_ref().map(|t| t.len()),
        );
        let response = self.send(token, request).await?;
        response
            .json::<ChatCompletion>()
            .await
            .map_err(|e| AgentError::Backend(format!("invalid completion response: {}", e)))
    }

    async fn open_stream(
        &self,
        token: &str,
        request: &ChatRequest,
    ) -> Result<ChunkStream, AgentError> {
        log::debug!(
            "open_stream: model={}, messages={}",
            request.model,
            request.messages.len(),
        );
        let response = self.send(token, request).await?;
        let mut upstream = response.bytes_stream();

        // Bounded channel: the relay consumes one payload at a time, so the
        // producer blocks instead of buffering an unbounded backlog.
        let (tx, rx) = mpsc::channel::<Result<Bytes, AgentError>>(16);
        tokio::spawn(async move {
            let mut splitter = SseSplitter::new();
            while let Some(chunk) = upstream.next().await {
                match chunk {
                    Ok(bytes) => {
                        for event in splitter.push(&bytes) {
                            match event {
                                SseEvent::Data(payload) => {
                                    if tx.send(Ok(payload)).await.is_err() {
                                        return;
                                    }
                                }
                                SseEvent::Done => return,
                            }
                        }
                    }
                    Err(e) => {
                        let _ = tx.send(Err(AgentError::Stream(e.to_string()))).await;
                        return;
                    }
                }
            }
            // Upstream closed without the sentinel: surface as a dropped stream.
            let _ = tx
                .send(Err(AgentError::Stream(
                    "upstream closed before [DONE]".into(),
                )))
                .await;
        });

        Ok(Box::pin(ReceiverStream::new(rx)))
    }
}
