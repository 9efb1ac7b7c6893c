//! A thin facade restricting a stream to text chunks.
//!
//! Adds no concurrency of its own: every call forwards straight to the
//! underlying [`BidirectionalStream`], filtering or tagging `ChunkKind::Text`.

use std::sync::Arc;

use crate::chunk::{Chunk, ChunkKind};
use crate::error::StreamError;
use crate::stream::BidirectionalStream;

pub struct TextAdapter {
    stream: Arc<BidirectionalStream>,
}

impl TextAdapter {
    pub fn new(stream: Arc<BidirectionalStream>) -> Self {
        Self { stream }
    }

    pub fn send(&self, text: impl Into<String>) -> Result<(), StreamError> {
        self.stream.send(Chunk::text(text))
    }

    /// Waits for the next text chunk, skipping any non-text chunks that
    /// arrive in between (e.g. from a peer mixing media kinds).
    pub async fn recv(&self) -> Option<String> {
        loop {
            let chunk = self.stream.recv().await?;
            if chunk.kind == ChunkKind::Text {
                return chunk.payload_text;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::BidirectionalStreamBuilder;
    use crate::transport::MemoryTransport;

    #[tokio::test]
    async fn round_trips_text_through_an_echo_transport() {
        let stream = Arc::new(
            BidirectionalStreamBuilder::new()
                .transport(Box::new(MemoryTransport::echo(4)))
                .build(),
        );
        stream.start().await.unwrap();
        let adapter = TextAdapter::new(stream);

        adapter.send("hello").unwrap();
        assert_eq!(adapter.recv().await.as_deref(), Some("hello"));
    }
}
