//! Fire-and-forget notification of interrupt creation, fanned out by
//! [`InterruptKind`][super::interrupt::InterruptKind] rather than by
//! individual interrupt id.
//!
//! Errors returned by a handler are logged and otherwise have no effect on
//! the interrupt's lifecycle: a handler is a notification sink, not a
//! participant in resolution.

use async_trait::async_trait;

use super::interrupt::Interrupt;

#[async_trait]
pub trait InterruptHandler: Send + Sync {
    async fn handle(&self, interrupt: &Interrupt) -> Result<(), String>;
}
