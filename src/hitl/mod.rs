//! Human-in-the-loop interrupts: a stream (or its handler) can pause on an
//! out-of-band decision without blocking the stream's own workers.

pub mod handler;
pub mod interrupt;
pub mod manager;
pub mod store;

pub use handler::InterruptHandler;
pub use interrupt::{
    CreateInterruptOptions, Interrupt, InterruptKind, InterruptOption, InterruptStatus, Response,
};
pub use manager::InterruptManager;
pub use store::{InMemoryInterruptStore, InterruptStore};
