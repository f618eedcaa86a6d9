//! The outbound half-duplex channel to the caller.
//!
//! One acknowledgement write, zero or more ordered chunk writes, one
//! idempotent close. The sender half is this type; the receiver half becomes
//! the HTTP response body once the request commits. Frames written before
//! commit sit in the bounded channel — if the request fails first, they are
//! dropped with the channel and the caller still gets a clean error status.

use bytes::Bytes;
use tokio::sync::mpsc;

use crate::error::AgentError;

/// The fixed acknowledgement frame: an SSE data frame carrying an empty
/// assistant delta, written before the selector round-trip so the caller
/// sees liveness while the (potentially slow) selection runs.
pub fn ack_frame() -> Bytes {
    Bytes::from_static(
        b"data: {\"choices\":[{\"delta\":{\"role\":\"assistant\",\"content\":\"\"}}]}\n\n",
    )
}

/// Sender half of the response conduit.
pub struct ResponseChannel {
    tx: Option<mpsc::Sender<Bytes>>,
}

impl ResponseChannel {
    /// Create a channel pair. The receiver feeds the HTTP response body.
    pub fn pair(buffer: usize) -> (Self, mpsc::Receiver<Bytes>) {
        let (tx, rx) = mpsc::channel(buffer);
        (Self { tx: Some(tx) }, rx)
    }

    /// Write the acknowledgement frame. Called once, before any model
    /// round-trip.
    pub async fn acknowledge(&mut self) -> Result<(), AgentError> {
        self.write_chunk(ack_frame()).await
    }

    /// Append raw bytes, preserving call order. Backpressured: the send
    /// waits for channel capacity, so a slow caller slows the producer.
    pub async fn write_chunk(&mut self, bytes: Bytes) -> Result<(), AgentError> {
        let tx = self
            .tx
            .as_ref()
            .ok_or_else(|| AgentError::Stream("write after close".into()))?;
        tx.send(bytes)
            .await
            .map_err(|_| AgentError::Stream("caller hung up".into()))
    }

    /// End the response. Safe to call more than once.
    pub fn close(&mut self) {
        self.tx.take();
    }
}
