//! The dispatch pipeline: selector → (executor | fallback) → streamer.
//!
//! Exactly one streaming call per request. The three remote calls are
//! strictly sequential — each depends on the previous stage's output — so
//! there is no fan-out here, only the chunk relay's producer/consumer pair.

pub mod channel;
pub mod executor;
pub mod selector;
pub mod streamer;

pub use self::channel::ResponseChannel;
pub use self::executor::Executor;
pub use self::selector::{CapabilityInvocation, Selector, SELECTOR_MODEL};

use std::sync::Arc;

use crate::capabilities::{CapabilityContext, CapabilityRegistry, DEFAULT_MODEL};
use crate::catalog::CatalogEntry;
use crate::error::AgentError;
use crate::llm::{ChatBackend, ChatMessage, ChunkStream};

/// Wires the pipeline stages together for one request at a time.
pub struct Dispatcher {
    backend: Arc<dyn ChatBackend>,
    registry: Arc<CapabilityRegistry>,
}

impl Dispatcher {
    pub fn new(backend: Arc<dyn ChatBackend>, registry: Arc<CapabilityRegistry>) -> Self {
        Self { backend, registry }
    }

    /// Run selection and (optionally) capability execution, then open the
    /// answer stream. Everything here can still fail with a clean error
    /// status; the caller commits the response only on `Ok` and then relays.
    pub async fn prepare(
        &self,
        token: &str,
        catalog: &[CatalogEntry],
        conversation: &[ChatMessage],
    ) -> Result<ChunkStream, AgentError> {
        let selector = Selector::new(self.backend.as_ref(), &self.registry);
        let selection = selector.select(token, catalog, conversation).await?;

        let (target_model, messages) = match selection {
            Some(invocation) => {
                log::debug!("capability '{}' selected", invocation.name);
                let ctx = CapabilityContext {
                    conversation,
                    catalog,
                };
                let result = Executor::new(&self.registry)
                    .execute(&ctx, &invocation)
                    .await?;
                (result.target_model, result.messages)
            }
            None => {
                log::debug!("no capability selected; answering directly");
                (DEFAULT_MODEL.to_string(), conversation.to_vec())
            }
        };

        let request = streamer::answer_request(target_model, messages);
        self.backend.open_stream(token, &request).await
    }
}
