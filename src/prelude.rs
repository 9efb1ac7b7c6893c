//! Common imports for embedders of this crate.

pub use crate::chunk::{Chunk, ChunkKind};
pub use crate::config::StreamConfig;
pub use crate::error::{InterruptError, StreamError, TransportError};
pub use crate::handler::{NoopHandler, StreamHandler};
pub use crate::hitl::{
    CreateInterruptOptions, InMemoryInterruptStore, Interrupt, InterruptHandler, InterruptKind,
    InterruptManager, InterruptOption, InterruptStatus, InterruptStore, Response,
};
pub use crate::registry::StreamRegistry;
pub use crate::state::{StateChangeEvent, StreamState};
pub use crate::stream::{BidirectionalStream, BidirectionalStreamBuilder};
pub use crate::transport::{Transport, TransportFactory};

pub type StreamResult<T> = Result<T, StreamError>;
