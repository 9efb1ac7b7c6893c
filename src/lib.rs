//! A transport-agnostic bidirectional streaming core: typed chunks, a
//! lifecycle state machine, bounded backpressure, heartbeat-driven liveness
//! detection, reconnection with exponential backoff, and human-in-the-loop
//! interrupts.
//!
//! The streaming core itself ([`stream::BidirectionalStream`]) never knows
//! about a concrete wire protocol; it is built against the [`transport::Transport`]
//! trait, with an in-memory implementation for tests and a length-prefixed
//! JSON-over-any-`AsyncRead`/`AsyncWrite` implementation as the reference
//! wire format.

pub mod adapters;
pub mod chunk;
pub mod config;
pub mod error;
pub mod handler;
pub mod hitl;
mod liveness;
pub mod logging;
mod pipeline;
mod reconnect;
pub mod registry;
pub mod state;
pub mod stream;
pub mod transport;
mod utils;
pub mod prelude;

pub use chunk::{Chunk, ChunkKind};
pub use config::StreamConfig;
pub use error::{InterruptError, StreamError, TransportError};
pub use handler::{NoopHandler, StreamHandler};
pub use hitl::{
    CreateInterruptOptions, InMemoryInterruptStore, Interrupt, InterruptHandler, InterruptKind,
    InterruptManager, InterruptOption, InterruptStatus, InterruptStore, Response,
};
pub use registry::StreamRegistry;
pub use state::{StateChangeEvent, StreamState};
pub use stream::{BidirectionalStream, BidirectionalStreamBuilder};
pub use transport::{Transport, TransportFactory};
