//! The fan-in error channel and its observer worker.
//!
//! Transport/heartbeat failures are diagnostics, not control flow: the
//! inbound, outbound and liveness workers each decide on their own whether
//! to reconnect or give up (§4.4–§4.5), and only *publish* what happened
//! here for whoever drains it. The observer worker is the crate's own
//! drain, turning every event into a `tracing` log line, so an event
//! is never silently lost even when nothing else is watching.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::{error, info_span, warn, Instrument};

/// One recoverable failure observed by a stream's worker. Diagnostic only:
/// publishing an event never itself changes stream state.
#[derive(Debug, Clone)]
pub(crate) struct ErrorEvent {
    pub source: &'static str,
    pub message: String,
}

#[derive(Clone)]
pub(crate) struct ErrorSender {
    inner: mpsc::UnboundedSender<ErrorEvent>,
}

impl ErrorSender {
    pub fn publish(&self, source: &'static str, message: impl Into<String>) {
        // An unbounded channel whose only consumer is this stream's own
        // observer task never fills; a send failure just means the stream
        // has already closed and the observer has exited.
        let _ = self.inner.send(ErrorEvent {
            source,
            message: message.into(),
        });
    }
}

pub(crate) struct ErrorReceiver {
    inner: mpsc::UnboundedReceiver<ErrorEvent>,
}

pub(crate) fn channel() -> (ErrorSender, ErrorReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ErrorSender { inner: tx }, ErrorReceiver { inner: rx })
}

/// Drains the error channel until shutdown, logging every event. This is
/// the fourth per-stream worker the design calls for alongside inbound,
/// outbound and heartbeat.
pub(crate) async fn run(stream_id: Arc<str>, mut rx: ErrorReceiver, mut shutdown: watch::Receiver<bool>) {
    let span = info_span!("error_observer", stream_id = %stream_id);
    async move {
        loop {
            tokio::select! {
                _ = shutdown.changed() => return,
                event = rx.inner.recv() => {
                    match event {
                        Some(event) => warn!(source = event.source, message = %event.message, "stream error observed"),
                        None => {
                            error!("error channel closed without a shutdown signal");
                            return;
                        }
                    }
                }
            }
        }
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_after_the_observer_drops_never_panics() {
        let (tx, rx) = channel();
        drop(rx);
        tx.publish("inbound", "read failed");
    }

    #[tokio::test]
    async fn observer_exits_once_the_channel_closes() {
        let (tx, rx) = channel();
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(run(Arc::from("s1"), rx, shutdown_rx));
        tx.publish("heartbeat", "send failed");
        drop(tx);
        tokio::time::timeout(std::time::Duration::from_secs(1), handle)
            .await
            .expect("observer should exit once the channel closes")
            .unwrap();
    }

    #[tokio::test]
    async fn observer_exits_promptly_on_shutdown() {
        let (_tx, rx) = channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(run(Arc::from("s1"), rx, shutdown_rx));
        shutdown_tx.send(true).unwrap();
        tokio::time::timeout(std::time::Duration::from_secs(1), handle)
            .await
            .expect("observer should exit on shutdown")
            .unwrap();
    }
}
