//! Request-fatal error taxonomy for the agent pipeline.
//!
//! Every remote-call failure is terminal for the request — there are no
//! retries. Errors raised before the response commits map to a clean HTTP
//! status; errors raised after the first streamed byte can only truncate
//! the stream (the status is already on the wire).

use axum::http::StatusCode;
use thiserror::Error;

/// Errors that abort an agent request.
#[derive(Debug, Error)]
pub enum AgentError {
    /// Missing or invalid request signature, unknown signing key, or a
    /// failure talking to the signing-key service.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The inbound request body could not be parsed.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The selector's tool-call arguments do not parse into the shape the
    /// capability expects.
    #[error("malformed tool arguments: {0}")]
    MalformedArguments(String),

    /// The selector named a capability that is not in the registry. The
    /// name came from the backend and is untrusted input.
    #[error("unknown capability: {0}")]
    UnknownCapability(String),

    /// A capability referenced a model that is not in the catalog.
    #[error("model not found: {0}")]
    NotFound(String),

    /// A capability's own logic failed.
    #[error("capability execution failed: {0}")]
    Execution(String),

    /// The catalog snapshot could not be fetched or decoded.
    #[error("catalog error: {0}")]
    Catalog(String),

    /// A chat-completion call failed at the transport or status level.
    #[error("backend error: {0}")]
    Backend(String),

    /// The completion stream failed or was written to after close.
    #[error("stream error: {0}")]
    Stream(String),
}

impl AgentError {
    /// HTTP status for errors raised before the response commits.
    ///
    /// Bodies stay opaque: the status is all the caller learns, details go
    /// to the log.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Authentication(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::MalformedArguments(_)
            | Self::UnknownCapability(_)
            | Self::NotFound(_)
            | Self::Execution(_)
            | Self::Catalog(_)
            | Self::Backend(_)
            | Self::Stream(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
