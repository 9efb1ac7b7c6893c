//! Single-assignment human-in-the-loop waiters.
//!
//! Grounded on the same idiom the host application uses for its command
//! channel's response slots: a [`DashMap`] of pending entries plus a
//! [`tokio::sync::oneshot`] per entry, so resolving an interrupt from a
//! completely unrelated task is just a map lookup and a send.

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::oneshot;
use tracing::warn;
use ulid::Ulid;

use crate::error::InterruptError;

use super::handler::InterruptHandler;
use super::interrupt::{
    CreateInterruptOptions, Interrupt, InterruptKind, InterruptStatus, Response,
    DEFAULT_INTERRUPT_TIMEOUT,
};
use super::store::InterruptStore;

pub struct InterruptManager {
    pending: DashMap<String, oneshot::Sender<Response>>,
    store: Arc<dyn InterruptStore>,
    handlers: DashMap<InterruptKind, Vec<Arc<dyn InterruptHandler>>>,
}

impl InterruptManager {
    pub fn new(store: Arc<dyn InterruptStore>) -> Self {
        Self {
            pending: DashMap::new(),
            store,
            handlers: DashMap::new(),
        }
    }

    /// Registers a fire-and-forget notification sink for every interrupt of
    /// `kind` that gets created from now on.
    pub fn register_handler(&self, kind: InterruptKind, handler: Arc<dyn InterruptHandler>) {
        self.handlers.entry(kind).or_default().push(handler);
    }

    /// Raises a new interrupt, notifies its kind's handlers, and blocks the
    /// caller until it is resolved, canceled, or its timeout elapses.
    ///
    /// `opts.timeout` of [`std::time::Duration::ZERO`] is normalized to 24
    /// hours.
    pub async fn create_interrupt(&self, opts: CreateInterruptOptions) -> Result<Response, InterruptError> {
        let timeout = if opts.timeout.is_zero() {
            DEFAULT_INTERRUPT_TIMEOUT
        } else {
            opts.timeout
        };

        let interrupt = Interrupt {
            id: Ulid::new().to_string(),
            workflow_id: opts.workflow_id,
            node_id: opts.node_id,
            kind: opts.kind,
            status: InterruptStatus::Pending,
            title: opts.title,
            description: opts.description,
            data: opts.data,
            options: opts.options,
            input_schema: opts.input_schema,
            response: None,
            created_at: Utc::now(),
            resolved_at: None,
            timeout,
            metadata: opts.metadata,
        };

        self.store.save(interrupt.clone()).await;
        self.notify_handlers(&interrupt);

        let (tx, rx) = oneshot::channel();
        self.pending.insert(interrupt.id.clone(), tx);

        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(_)) => Err(InterruptError::Cancelled),
            Err(_) => {
                // The waiter may have already been claimed by a resolve/cancel
                // that raced the timeout; only the side that actually removes
                // the entry gets to declare the outcome.
                if self.pending.remove(&interrupt.id).is_some() {
                    if let Some(mut stored) = self.store.load(&interrupt.id).await {
                        stored.status = InterruptStatus::Timeout;
                        stored.resolved_at = Some(Utc::now());
                        self.store.update(stored).await;
                    }
                }
                Err(InterruptError::Timeout)
            }
        }
    }

    /// Fans `interrupt` out to every handler registered for its kind,
    /// fire-and-forget. A handler error is logged and otherwise ignored.
    fn notify_handlers(&self, interrupt: &Interrupt) {
        let Some(handlers) = self.handlers.get(&interrupt.kind) else {
            return;
        };
        for handler in handlers.iter().cloned() {
            let interrupt = interrupt.clone();
            tokio::spawn(async move {
                if let Err(e) = handler.handle(&interrupt).await {
                    warn!(error = %e, interrupt_id = %interrupt.id, "interrupt handler failed");
                }
            });
        }
    }

    /// Delivers `response` to whoever is awaiting this interrupt's
    /// [`create_interrupt`][Self::create_interrupt] call.
    ///
    /// Single-assignment: once the pending waiter is removed (by a resolve,
    /// a cancel, or a timeout), a further call for the same id fails with
    /// [`InterruptError::NotFound`].
    pub async fn resolve_interrupt(&self, id: &str, response: Response) -> Result<(), InterruptError> {
        let (_, sender) = self
            .pending
            .remove(id)
            .ok_or_else(|| InterruptError::NotFound(id.to_string()))?;

        if let Some(mut interrupt) = self.store.load(id).await {
            interrupt.status = if response.approved {
                InterruptStatus::Resolved
            } else {
                InterruptStatus::Rejected
            };
            interrupt.resolved_at = Some(Utc::now());
            interrupt.response = Some(response.clone());
            self.store.update(interrupt).await;
        }

        // The waiter may already be gone (its call timed out and moved on);
        // that's not this call's problem.
        let _ = sender.send(response);
        Ok(())
    }

    /// Cancels a pending interrupt: its waiter fails with
    /// [`InterruptError::Cancelled`] instead of receiving a response.
    pub async fn cancel_interrupt(&self, id: &str) -> Result<(), InterruptError> {
        let (_, sender) = self
            .pending
            .remove(id)
            .ok_or_else(|| InterruptError::NotFound(id.to_string()))?;
        drop(sender);

        if let Some(mut interrupt) = self.store.load(id).await {
            interrupt.status = InterruptStatus::Canceled;
            interrupt.resolved_at = Some(Utc::now());
            self.store.update(interrupt).await;
        }
        Ok(())
    }

    /// A snapshot of currently pending interrupts, optionally scoped to one workflow.
    pub async fn get_pending(&self, workflow_id: Option<&str>) -> Vec<Interrupt> {
        self.store.list(workflow_id, Some(InterruptStatus::Pending)).await
    }
}
