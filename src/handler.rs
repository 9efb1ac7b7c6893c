//! Application hooks into the stream lifecycle.
//!
//! A [`StreamHandler`] is the collaborator the core calls out to; it never
//! drives the stream itself. All methods have no-op defaults so an embedder
//! can implement only the hook it cares about.

use async_trait::async_trait;

use crate::chunk::Chunk;
use crate::error::StreamError;
use crate::state::StateChangeEvent;

#[async_trait]
pub trait StreamHandler: Send + Sync {
    /// Called by the inbound worker for every non-heartbeat chunk read off
    /// the transport, before it is queued for [`crate::stream::BidirectionalStream::recv`].
    /// Returning `Ok(Some(chunk))` delivers (a possibly transformed) chunk;
    /// `Ok(None)` suppresses it; `Err` logs and drops it the same way.
    async fn on_inbound(&self, chunk: Chunk) -> Result<Option<Chunk>, StreamError> {
        Ok(Some(chunk))
    }

    /// Called by the outbound worker just before a chunk is written to the
    /// transport. Returning `Err` skips the send entirely.
    async fn on_outbound(&self, _chunk: &Chunk) -> Result<(), StreamError> {
        Ok(())
    }

    /// Called whenever the stream's lifecycle state changes.
    async fn on_state_change(&self, _event: StateChangeEvent) {}
}

/// A [`StreamHandler`] that does nothing; the default when an embedder has
/// no hooks to run.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHandler;

#[async_trait]
impl StreamHandler for NoopHandler {}
