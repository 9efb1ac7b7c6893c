//! A thin facade restricting a stream to audio chunks: attaches
//! `sample_rate`/`channels` metadata on send, and runs an optional
//! encoder/decoder around the raw sample bytes.
//!
//! Neither direction introduces concurrency of its own; `send`/`recv` run on
//! the caller's task against the underlying stream's own queues.

use std::sync::Arc;

use tracing::warn;

use crate::chunk::{Chunk, ChunkKind};
use crate::error::StreamError;
use crate::stream::BidirectionalStream;

/// Transforms raw audio sample bytes before they're sent, and reverses the
/// transform on receive (e.g. Opus encode/decode). A decode failure drops
/// the chunk rather than surfacing an error to the caller (§4.8).
pub trait AudioCodec: Send + Sync {
    fn encode(&self, samples: &[u8]) -> Vec<u8>;
    fn decode(&self, payload: &[u8]) -> Option<Vec<u8>>;
}

/// The identity codec: samples pass through unchanged. The default when an
/// embedder has no encoder/decoder to run.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughCodec;

impl AudioCodec for PassthroughCodec {
    fn encode(&self, samples: &[u8]) -> Vec<u8> {
        samples.to_vec()
    }

    fn decode(&self, payload: &[u8]) -> Option<Vec<u8>> {
        Some(payload.to_vec())
    }
}

pub struct AudioAdapter {
    stream: Arc<BidirectionalStream>,
    sample_rate: u32,
    channels: u16,
    codec: Arc<dyn AudioCodec>,
}

impl AudioAdapter {
    pub fn new(stream: Arc<BidirectionalStream>, sample_rate: u32, channels: u16) -> Self {
        Self {
            stream,
            sample_rate,
            channels,
            codec: Arc::new(PassthroughCodec),
        }
    }

    pub fn with_codec(mut self, codec: Arc<dyn AudioCodec>) -> Self {
        self.codec = codec;
        self
    }

    /// Encodes `samples` (if a codec is installed) and sends them as an
    /// audio-kind chunk tagged with this adapter's `sample_rate`/`channels`.
    pub fn send(&self, samples: impl Into<Vec<u8>>) -> Result<(), StreamError> {
        let encoded = self.codec.encode(&samples.into());
        let chunk = Chunk::bytes(ChunkKind::Audio, encoded)
            .with_metadata("sample_rate", self.sample_rate)
            .with_metadata("channels", self.channels);
        self.stream.send(chunk)
    }

    /// Waits for the next audio chunk and decodes it. A chunk whose payload
    /// fails to decode is dropped and the wait continues, matching the
    /// "encoder/decoder failures on the receive path drop the chunk" rule.
    pub async fn recv(&self) -> Option<Vec<u8>> {
        loop {
            let chunk = self.stream.recv().await?;
            if chunk.kind != ChunkKind::Audio {
                continue;
            }
            let Some(payload) = chunk.payload_bytes else {
                continue;
            };
            match self.codec.decode(&payload) {
                Some(decoded) => return Some(decoded),
                None => {
                    warn!(sequence = chunk.sequence, "dropping audio chunk that failed to decode");
                    continue;
                }
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
    async fn round_trips_audio_samples_through_an_echo_transport() {
        let stream = Arc::new(
            BidirectionalStreamBuilder::new()
                .transport(Box::new(MemoryTransport::echo(4)))
                .build(),
        );
        stream.start().await.unwrap();
        let adapter = AudioAdapter::new(stream, 16_000, 1);

        adapter.send(vec![1, 2, 3]).unwrap();
        assert_eq!(adapter.recv().await, Some(vec![1, 2, 3]));
    }

    #[tokio::test]
    async fn send_tags_chunks_with_sample_rate_and_channel_metadata() {
        let (a, b) = MemoryTransport::pair(4);
        let sender_stream = Arc::new(BidirectionalStreamBuilder::new().transport(Box::new(a)).build());
        let receiver_stream = Arc::new(BidirectionalStreamBuilder::new().transport(Box::new(b)).build());
        sender_stream.start().await.unwrap();
        receiver_stream.start().await.unwrap();

        AudioAdapter::new(sender_stream, 48_000, 2).send(vec![9, 9]).unwrap();
        let chunk = receiver_stream.recv().await.unwrap();

        assert_eq!(chunk.metadata.get("sample_rate"), Some(&serde_json::json!(48_000)));
        assert_eq!(chunk.metadata.get("channels"), Some(&serde_json::json!(2)));
    }

    struct RejectingCodec;

    impl AudioCodec for RejectingCodec {
        fn encode(&self, samples: &[u8]) -> Vec<u8> {
            samples.to_vec()
        }

        fn decode(&self, _payload: &[u8]) -> Option<Vec<u8>> {
            None
        }
    }

    #[tokio::test]
    async fn a_decode_failure_drops_the_chunk_instead_of_returning_it() {
        let stream = Arc::new(
            BidirectionalStreamBuilder::new()
                .transport(Box::new(MemoryTransport::echo(4)))
                .build(),
        );
        stream.start().await.unwrap();

        let sender = AudioAdapter::new(stream.clone(), 16_000, 1);
        sender.send(vec![1, 2, 3]).unwrap();

        let receiver = AudioAdapter::new(stream, 16_000, 1).with_codec(Arc::new(RejectingCodec));
        // Every chunk fails to decode under `RejectingCodec`, so recv() never
        // returns; bound the wait instead of hanging the test.
        let result = tokio::time::timeout(std::time::Duration::from_millis(50), receiver.recv()).await;
        assert!(result.is_err(), "recv should keep waiting past undecodable chunks");
    }
}
