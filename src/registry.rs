//! Process-wide lookup of active streams by id.
//!
//! Mirrors the host application's `StreamManager::global()` singleton: a
//! `DashMap` keyed by an opaque id, shared through an `Arc` rather than
//! behind a lock so concurrent lookups never block each other.

use std::sync::Arc;

use dashmap::DashMap;

use crate::stream::BidirectionalStream;

/// Returned when a registry operation names a stream id that isn't present.
#[derive(Debug, thiserror::Error)]
#[error("no stream registered with id {0}")]
pub struct StreamNotFound(pub String);

/// A concurrent registry of live [`BidirectionalStream`]s.
///
/// Streams register themselves (or are registered by whoever constructed
/// them) under their own [`BidirectionalStream::id`] and are looked up by
/// that id from anywhere else that holds a handle to the registry.
#[derive(Default)]
pub struct StreamRegistry {
    streams: DashMap<String, Arc<BidirectionalStream>>,
}

impl StreamRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `stream`, replacing and returning any previous entry at the
    /// same id.
    pub fn register(&self, stream: Arc<BidirectionalStream>) -> Option<Arc<BidirectionalStream>> {
        self.streams.insert(stream.id().to_string(), stream)
    }

    pub fn unregister(&self, id: &str) -> Option<Arc<BidirectionalStream>> {
        self.streams.remove(id).map(|(_, stream)| stream)
    }

    /// Removes `id` from the registry, then closes the stream that was
    /// registered under it. A no-op if no stream is registered under `id`.
    pub async fn close(&self, id: &str) {
        if let Some(stream) = self.unregister(id) {
            let _ = stream.close().await;
        }
    }

    pub fn get(&self, id: &str) -> Option<Arc<BidirectionalStream>> {
        self.streams.get(id).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.streams.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    /// Closes and removes every registered stream, e.g. on process shutdown.
    pub async fn close_all(&self) {
        let ids: Vec<String> = self.streams.iter().map(|e| e.key().clone()).collect();
        for id in ids {
            self.close(&id).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::BidirectionalStreamBuilder;
    use crate::transport::MemoryTransport;

    fn sample_stream(id: &str) -> Arc<BidirectionalStream> {
        Arc::new(
            BidirectionalStreamBuilder::new()
                .id(id)
                .transport(Box::new(MemoryTransport::echo(4)))
                .build(),
        )
    }

    #[test]
    fn register_and_get_round_trip() {
        let registry = StreamRegistry::new();
        let stream = sample_stream("s1");
        assert!(registry.register(stream.clone()).is_none());
        assert!(registry.get("s1").is_some());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn registering_the_same_id_twice_returns_the_previous_entry() {
        let registry = StreamRegistry::new();
        let first = sample_stream("dup");
        let second = sample_stream("dup");
        assert!(registry.register(first).is_none());
        assert!(registry.register(second).is_some());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn unregister_removes_and_returns_the_entry() {
        let registry = StreamRegistry::new();
        registry.register(sample_stream("gone"));
        assert!(registry.unregister("gone").is_some());
        assert!(registry.get("gone").is_none());
        assert!(registry.unregister("gone").is_none());
    }

    #[tokio::test]
    async fn close_removes_the_entry_and_closes_the_stream() {
        let registry = StreamRegistry::new();
        let stream = sample_stream("s1");
        registry.register(stream.clone());
        stream.start().await.unwrap();

        registry.close("s1").await;

        assert!(registry.get("s1").is_none());
        assert_eq!(stream.get_state(), crate::state::StreamState::Disconnected);
    }

    #[tokio::test]
    async fn closing_an_unknown_id_is_a_no_op() {
        let registry = StreamRegistry::new();
        registry.close("missing").await;
        assert_eq!(registry.len(), 0);
    }
}
