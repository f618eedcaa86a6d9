//! Axum route handlers.
//!
//! # Routes
//!
//! - `GET  /health` — liveness probe, independent of the pipeline
//! - `POST /agent`  — one signed chat turn in, one SSE frame stream out
//!
//! The `/agent` handler reads the raw body first (the signature covers the
//! exact bytes), verifies it, parses, fetches the catalog snapshot, enqueues
//! the acknowledgement, runs the dispatcher, and only then commits the
//! response. Anything that fails before commit surfaces as a clean status
//! with an opaque body.

use std::sync::Arc;

use axum::{
    body::{Body, Bytes},
    extract::State,
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use futures::StreamExt;
use serde::Deserialize;
use tokio_stream::wrappers::ReceiverStream;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::auth::RequestVerifier;
use crate::capabilities::CapabilityRegistry;
use crate::catalog::ModelCatalog;
use crate::error::AgentError;
use crate::llm::{ChatBackend, ChatMessage};
use crate::pipeline::{streamer, Dispatcher, ResponseChannel};

/// Hex HMAC-SHA256 of the raw request body.
pub const SIGNATURE_HEADER: &str = "x-modeldesk-signature";
/// Names the signing key used for the signature.
pub const KEY_ID_HEADER: &str = "x-modeldesk-key-identifier";
/// Caller-scoped access token, forwarded as the bearer credential on every
/// outbound call for this request.
pub const TOKEN_HEADER: &str = "x-modeldesk-token";

/// Shared application state: one trait object per collaborator so tests
/// substitute fakes at every seam.
#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<dyn ChatBackend>,
    pub catalog: Arc<dyn ModelCatalog>,
    pub verifier: Arc<dyn RequestVerifier>,
    pub registry: Arc<CapabilityRegistry>,
}

/// Inbound request body. Unknown fields are ignored.
#[derive(Debug, Deserialize)]
pub struct AgentRequest {
    pub messages: Vec<ChatMessage>,
}

/// Build the axum router.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/agent", post(agent_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// GET /health — liveness probe.
async fn health_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "modeldesk",
        "version": crate::VERSION,
    }))
}

/// POST /agent — run one chat turn through the pipeline.
async fn agent_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    match run_pipeline(state, &headers, body).await {
        Ok(response) => response,
        Err(e) => {
            log::warn!("agent request failed: {}", e);
            // Opaque body: the status is all the caller learns.
            e.status_code().into_response()
        }
    }
}

fn required_header<'a>(headers: &'a HeaderMap, name: &str) -> Result<&'a str, AgentError> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AgentError::Authentication(format!("missing header {}", name)))
}

async fn run_pipeline(
    state: AppState,
    headers: &HeaderMap,
    body: Bytes,
) -> Result<Response, AgentError> {
    let signature = required_header(headers, SIGNATURE_HEADER)?;
    let key_id = required_header(headers, KEY_ID_HEADER)?;
    let token = required_header(headers, TOKEN_HEADER)?.to_string();

    state.verifier.verify(&body, signature, key_id).await?;

    let request: AgentRequest =
        serde_json::from_slice(&body).map_err(|e| AgentError::BadRequest(e.to_string()))?;

    // One snapshot per request; the selector preamble and capability
    // execution both see the same catalog.
    let catalog = state.catalog.snapshot(&token).await?;

    let (mut channel, rx) = ResponseChannel::pair(16);
    // Enqueued now, transmitted as the first body frame once the response
    // commits; dropped with the channel if anything below fails first.
    channel.acknowledge().await?;

    let dispatcher = Dispatcher::new(state.backend.clone(), state.registry.clone());
    let upstream = dispatcher
        .prepare(&token, &catalog, &request.messages)
        .await?;

    // Commit point: from here on, failures can only truncate the stream.
    tokio::spawn(streamer::relay(upstream, channel));

    let body_stream = ReceiverStream::new(rx).map(Ok::<_, std::convert::Infallible>);
    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, "text/event-stream")
        .body(Body::from_stream(body_stream))
        .map_err(|e| AgentError::Stream(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{
        no_tool_completion, sample_catalog, tool_call_completion, AcceptAll, FixedCatalog,
        RejectAll, ScriptedBackend,
    };
    use axum::http::Request;
    use tower::ServiceExt;

    const ACK_FRAME: &str =
        "data: {\"choices\":[{\"delta\":{\"role\":\"assistant\",\"content\":\"\"}}]}\n\n";

    fn state_with(backend: Arc<ScriptedBackend>, verifier: Arc<dyn RequestVerifier>) -> AppState {
        AppState {
            backend,
            catalog: Arc::new(FixedCatalog::new(sample_catalog())),
            verifier,
            registry: Arc::new(CapabilityRegistry::standard()),
        }
    }

    fn signed_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/agent")
            .header("Content-Type", "application/json")
            .header(SIGNATURE_HEADER, "aabbccdd")
            .header(KEY_ID_HEADER, "key-2024")
            .header(TOKEN_HEADER, "caller-token")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn payloads(n: usize) -> Vec<Result<bytes::Bytes, AgentError>> {
        (1..=n)
            .map(|i| Ok(bytes::Bytes::from(format!("{{\"n\":{}}}", i))))
            .collect()
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let backend = Arc::new(ScriptedBackend::new(no_tool_completion()));
        let app = app_router(state_with(backend, Arc::new(RejectAll)));

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["service"], "modeldesk");
        assert_eq!(json["version"], crate::VERSION);
    }

    #[tokio::test]
    async fn missing_signature_headers_reject_before_any_backend_call() {
        let backend = Arc::new(ScriptedBackend::new(no_tool_completion()));
        let app = app_router(state_with(backend.clone(), Arc::new(AcceptAll)));

        let request = Request::builder()
            .method("POST")
            .uri("/agent")
            .body(Body::from(r#"{"messages":[]}"#))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(backend.complete_requests().is_empty());
        assert!(backend.stream_requests().is_empty());
    }

    #[tokio::test]
    async fn invalid_signature_rejects_with_401() {
        let backend = Arc::new(ScriptedBackend::new(no_tool_completion()));
        let app = app_router(state_with(backend.clone(), Arc::new(RejectAll)));

        let response = app
            .oneshot(signed_request(r#"{"messages":[]}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(backend.complete_requests().is_empty());
        assert_eq!(body_text(response).await, "");
    }

    #[tokio::test]
    async fn unparseable_body_rejects_with_400() {
        let backend = Arc::new(ScriptedBackend::new(no_tool_completion()));
        let app = app_router(state_with(backend, Arc::new(AcceptAll)));

        let response = app.oneshot(signed_request("{not json")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn fallback_path_streams_ack_chunks_then_done() {
        let backend = Arc::new(
            ScriptedBackend::new(no_tool_completion()).with_stream(payloads(2)),
        );
        let app = app_router(state_with(backend, Arc::new(AcceptAll)));

        let response = app
            .oneshot(signed_request(
                r#"{"messages":[{"role":"user","content":"tell me a joke"}]}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(CONTENT_TYPE).unwrap(),
            "text/event-stream"
        );

        let expected = format!(
            "{}data: {{\"n\":1}}\n\ndata: {{\"n\":2}}\n\ndata: [DONE]\n\n",
            ACK_FRAME
        );
        assert_eq!(body_text(response).await, expected);
    }

    #[tokio::test]
    async fn executes_named_model_with_rewritten_messages() {
        let backend = Arc::new(
            ScriptedBackend::new(tool_call_completion(&[(
                "execute_model",
                r#"{"model":"gpt-4o","instruction":"say hi"}"#,
            )]))
            .with_stream(payloads(1)),
        );
        let app = app_router(state_with(backend.clone(), Arc::new(AcceptAll)));

        let response = app
            .oneshot(signed_request(
                r#"{"messages":[{"role":"user","content":"using gpt-4o: say hi"}]}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let _ = body_text(response).await;

        let requests = backend.stream_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].model, "gpt-4o");
        assert_eq!(requests[0].messages.len(), 2);
        assert_eq!(requests[0].messages[1].content, "say hi");
    }

    #[tokio::test]
    async fn capability_not_found_is_500_with_zero_frames() {
        let backend = Arc::new(
            ScriptedBackend::new(tool_call_completion(&[(
                "describe_model",
                r#"{"model":"llama-2"}"#,
            )]))
            .with_stream(payloads(1)),
        );
        let app = app_router(state_with(backend.clone(), Arc::new(AcceptAll)));

        let response = app
            .oneshot(signed_request(
                r#"{"messages":[{"role":"user","content":"what is llama-2?"}]}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_text(response).await, "");
        assert!(backend.stream_requests().is_empty());
    }

    #[tokio::test]
    async fn stream_open_failure_is_500_with_zero_frames() {
        let backend = Arc::new(
            ScriptedBackend::new(no_tool_completion()).with_open_failure(),
        );
        let app = app_router(state_with(backend, Arc::new(AcceptAll)));

        let response = app
            .oneshot(signed_request(
                r#"{"messages":[{"role":"user","content":"hi"}]}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_text(response).await, "");
    }

    #[tokio::test]
    async fn mid_stream_failure_truncates_after_forwarded_chunks() {
        let items = vec![
            Ok(bytes::Bytes::from_static(b"{\"n\":1}")),
            Ok(bytes::Bytes::from_static(b"{\"n\":2}")),
            Err(AgentError::Stream("connection reset".into())),
            Ok(bytes::Bytes::from_static(b"{\"n\":4}")),
            Ok(bytes::Bytes::from_static(b"{\"n\":5}")),
        ];
        let backend = Arc::new(ScriptedBackend::new(no_tool_completion()).with_stream(items));
        let app = app_router(state_with(backend, Arc::new(AcceptAll)));

        let response = app
            .oneshot(signed_request(
                r#"{"messages":[{"role":"user","content":"hi"}]}"#,
            ))
            .await
            .unwrap();

        // Status committed before the failure; the caller sees truncation.
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_text(response).await;
        let expected = format!("{}data: {{\"n\":1}}\n\ndata: {{\"n\":2}}\n\n", ACK_FRAME);
        assert_eq!(body, expected);
        assert!(!body.contains("[DONE]"));
    }

    #[tokio::test]
    async fn catalog_is_fetched_once_per_request() {
        let backend = Arc::new(
            ScriptedBackend::new(tool_call_completion(&[(
                "describe_model",
                r#"{"model":"gpt-4o"}"#,
            )]))
            .with_stream(payloads(1)),
        );
        let catalog = Arc::new(FixedCatalog::new(sample_catalog()));
        let state = AppState {
            backend,
            catalog: catalog.clone(),
            verifier: Arc::new(AcceptAll),
            registry: Arc::new(CapabilityRegistry::standard()),
        };
        let app = app_router(state);

        let response = app
            .oneshot(signed_request(
                r#"{"messages":[{"role":"user","content":"what is gpt-4o?"}]}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let _ = body_text(response).await;

        // One snapshot serves both the selector preamble and the handler.
        assert_eq!(catalog.fetches(), 1);
    }

    #[tokio::test]
    async fn ack_precedes_every_model_derived_frame() {
        let backend = Arc::new(
            ScriptedBackend::new(no_tool_completion()).with_stream(payloads(3)),
        );
        let app = app_router(state_with(backend, Arc::new(AcceptAll)));

        let response = app
            .oneshot(signed_request(
                r#"{"messages":[{"role":"user","content":"hi"}]}"#,
            ))
            .await
            .unwrap();

        let body = body_text(response).await;
        assert!(body.starts_with(ACK_FRAME));
        assert_eq!(body.matches("delta").count(), 1);
    }
}
