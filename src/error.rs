use thiserror::Error;

/// Errors surfaced by a [`Transport`][crate::transport::Transport]
/// implementation.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("transport is closed")]
    Closed,
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to decode a chunk from the wire: {0}")]
    Decode(String),
    #[error("transport operation timed out")]
    Timeout,
}

/// Errors surfaced by [`BidirectionalStream`][crate::stream::BidirectionalStream]
/// operations.
#[derive(Error, Debug)]
pub enum StreamError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("outbound buffer is full")]
    OutboundBufferFull,
    #[error("stream handler failed: {0}")]
    Handler(String),
    #[error("heartbeat send failed: {0}")]
    HeartbeatFailed(TransportError),
    #[error("peer silence exceeded the configured heartbeat timeout")]
    HeartbeatTimeout,
    #[error("reconnection attempts exhausted after {attempts} tries")]
    ReconnectExhausted { attempts: u32 },
    #[error("stream was started without a transport or a reconnect factory")]
    NoTransport,
    #[error("stream is closed")]
    Closed,
}

/// Errors surfaced by [`InterruptManager`][crate::hitl::InterruptManager] operations.
#[derive(Error, Debug)]
pub enum InterruptError {
    #[error("interrupt timed out waiting for a response")]
    Timeout,
    #[error("no pending interrupt with id {0}")]
    NotFound(String),
    #[error("interrupt was cancelled before it was resolved")]
    Cancelled,
}
