//! Bounded chunk queues with a non-blocking, drop-on-full backpressure policy.
//!
//! Neither direction ever awaits backpressure: outbound `send` fails
//! synchronously so the caller can react, and inbound overflow is dropped
//! with a warning rather than stalling the reader task and, transitively,
//! the transport.

use tokio::sync::mpsc;
use tracing::warn;

use crate::chunk::Chunk;
use crate::error::StreamError;

/// The write half of a bounded chunk queue. `try_send` never blocks.
pub struct QueueSender {
    inner: mpsc::Sender<Chunk>,
}

impl QueueSender {
    pub fn try_send(&self, chunk: Chunk) -> Result<(), StreamError> {
        self.inner
            .try_send(chunk)
            .map_err(|_| StreamError::OutboundBufferFull)
    }

    /// Used by the inbound worker, which drops instead of erroring on a full
    /// queue; the transport keeps reading, and the oldest unconsumed chunk wins.
    pub fn try_send_or_drop(&self, chunk: Chunk, context: &str) {
        if let Err(mpsc::error::TrySendError::Full(_)) = self.inner.try_send(chunk) {
            warn!(context, "queue full, dropping chunk");
        }
    }
}

pub struct QueueReceiver {
    inner: mpsc::Receiver<Chunk>,
}

impl QueueReceiver {
    pub async fn recv(&mut self) -> Option<Chunk> {
        self.inner.recv().await
    }
}

/// Builds a bounded queue of the given capacity.
pub fn bounded(capacity: usize) -> (QueueSender, QueueReceiver) {
    let (tx, rx) = mpsc::channel(capacity);
    (QueueSender { inner: tx }, QueueReceiver { inner: rx })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::Chunk;

    #[tokio::test]
    async fn try_send_fails_synchronously_once_full() {
        let (tx, mut rx) = bounded(1);
        tx.try_send(Chunk::text("a")).unwrap();
        assert!(matches!(
            tx.try_send(Chunk::text("b")),
            Err(StreamError::OutboundBufferFull)
        ));
        assert_eq!(rx.recv().await.unwrap().payload_text.as_deref(), Some("a"));
    }

    #[tokio::test]
    async fn try_send_or_drop_never_panics_when_full() {
        let (tx, mut rx) = bounded(1);
        tx.try_send_or_drop(Chunk::text("a"), "test");
        tx.try_send_or_drop(Chunk::text("b"), "test");
        assert_eq!(rx.recv().await.unwrap().payload_text.as_deref(), Some("a"));
    }
}
