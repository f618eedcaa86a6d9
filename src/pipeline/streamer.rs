//! Completion streamer: the stage that produces the caller-visible answer.
//!
//! Split in two phases around the commit point. Building and opening the
//! streaming request (`answer_request` + `ChatBackend::open_stream`) can
//! still fail with a clean error status. `relay` runs after the response has
//! committed: each upstream payload is either fully forwarded as one
//! `data: <json>\n\n` frame or not forwarded at all, in arrival order, and a
//! mid-stream failure can only truncate — the status is already on the wire.

use bytes::Bytes;
use futures::StreamExt;

use crate::llm::{ChatMessage, ChatRequest, ChunkStream, StreamOptions};

use super::channel::ResponseChannel;

pub const DONE_FRAME: &[u8] = b"data: [DONE]\n\n";

/// The streaming answer call: capability-resolved target and messages, or
/// the fallback pair. Usage reporting stays off; the caller only ever sees
/// content chunks.
pub fn answer_request(target_model: String, messages: Vec<ChatMessage>) -> ChatRequest {
    ChatRequest {
        model: target_model,
        messages,
        stream: true,
        tools: None,
        tool_choice: None,
        stream_options: Some(StreamOptions {
            include_usage: false,
        }),
    }
}

/// Frame one upstream payload as an SSE data frame.
pub fn sse_frame(payload: &[u8]) -> Bytes {
    let mut frame = Vec::with_capacity(payload.len() + 8);
    frame.extend_from_slice(b"data: ");
    frame.extend_from_slice(payload);
    frame.extend_from_slice(b"\n\n");
    Bytes::from(frame)
}

/// Forward every upstream chunk to the channel, 1:1 and in order, then the
/// `[DONE]` sentinel. On a mid-stream failure the channel closes without the
/// sentinel and the caller observes a truncated but frame-aligned stream.
pub async fn relay(mut upstream: ChunkStream, mut channel: ResponseChannel) {
    let mut forwarded = 0usize;

    while let Some(item) = upstream.next().await {
        match item {
            Ok(payload) => {
                if channel.write_chunk(sse_frame(&payload)).await.is_err() {
                    log::debug!("caller went away after {} chunks", forwarded);
                    channel.close();
                    return;
                }
                forwarded += 1;
            }
            Err(e) => {
                log::warn!("completion stream failed after {} chunks: {}", forwarded, e);
                channel.close();
                return;
            }
        }
    }

    if channel.write_chunk(Bytes::from_static(DONE_FRAME)).await.is_err() {
        log::debug!("caller went away before the [DONE] sentinel");
    }
    log::debug!("stream complete: {} chunks forwarded", forwarded);
    channel.close();
}
