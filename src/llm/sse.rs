//! Incremental extraction of `data:` payloads from an SSE byte stream.
//!
//! The upstream completion API frames chunks as `data: <json>\n\n` lines and
//! ends the stream with `data: [DONE]`. Chunks arrive on arbitrary byte
//! boundaries, so the splitter buffers until a full line is available.

use bytes::Bytes;
use memchr::memchr;

/// One event extracted from the upstream byte stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseEvent {
    /// A `data:` payload (the raw JSON text, prefix stripped).
    Data(Bytes),
    /// The `[DONE]` sentinel.
    Done,
}

/// Stateful line splitter over the upstream byte stream.
#[derive(Debug, Default)]
pub struct SseSplitter {
    buffer: Vec<u8>,
}

impl SseSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one network chunk; returns every complete event it closed off.
    ///
    /// Non-`data:` lines (comments, event names, blank separators) are
    /// skipped. Callers stop consuming at `Done`.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(newline_pos) = memchr(b'\n', &self.buffer) {
            let line = match std::str::from_utf8(&self.buffer[..newline_pos]) {
                Ok(s) => s.trim(),
                Err(e) => {
                    log::warn!("invalid UTF-8 in completion stream: {}", e);
                    self.buffer.drain(..=newline_pos);
                    continue;
                }
            };

            if let Some(payload) = line.strip_prefix("data:").map(str::trim_start) {
                if payload == "[DONE]" {
                    events.push(SseEvent::Done);
                } else if !payload.is_empty() {
                    events.push(SseEvent::Data(Bytes::copy_from_slice(payload.as_bytes())));
                }
            }
            self.buffer.drain(..=newline_pos);
        }
        events
    }
}
