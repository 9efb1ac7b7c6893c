//! Transport abstraction: the polymorphic boundary between the streaming
//! core and whatever wire protocol actually carries chunks.
//!
//! Implementations must serialize their own writes internally. The core
//! calls `write_chunk` concurrently from the outbound worker and the
//! heartbeat worker and relies on the transport to not interleave frames.

use async_trait::async_trait;

use crate::chunk::Chunk;
use crate::error::TransportError;

mod codec;
pub mod duplex;
pub mod memory;

pub use duplex::DuplexTransport;
pub use memory::{MemoryTransport, MemoryTransportFactory};

/// A bidirectional, chunk-framed connection.
///
/// `close()` must be idempotent: a second call, and any read/write issued
/// after the first successful close, must fail with
/// [`TransportError::Closed`].
#[async_trait]
pub trait Transport: Send + Sync {
    /// Blocks until a complete logical chunk arrives or the transport fails.
    async fn read_chunk(&self) -> Result<Chunk, TransportError>;

    /// Serializes and transmits one chunk. Concurrent callers must be
    /// serialized by the implementation (e.g. behind an internal mutex).
    async fn write_chunk(&self, chunk: &Chunk) -> Result<(), TransportError>;

    /// Idempotent. Subsequent reads/writes must fail with
    /// [`TransportError::Closed`].
    async fn close(&self) -> Result<(), TransportError>;

    /// Non-authoritative liveness hint: `true` does not guarantee the next
    /// I/O call will succeed.
    fn is_alive(&self) -> bool;
}

/// Produces a fresh [`Transport`] for the reconnection controller.
///
/// `preferred_location` is an opaque hint (e.g. a previously negotiated
/// endpoint) the factory may use or ignore.
#[async_trait]
pub trait TransportFactory: Send + Sync {
    async fn connect(
        &self,
        preferred_location: Option<&str>,
    ) -> Result<Box<dyn Transport>, TransportError>;
}
