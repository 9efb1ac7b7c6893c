//! The outbound worker: drains the send queue onto the current transport.
//!
//! A write that fails is retried exactly once, against a freshly
//! reconnected transport; if that retry also fails the chunk is dropped.
//! There is no unbounded resend buffer, matching the queue's own
//! drop-on-overflow policy.

use std::sync::Arc;

use tracing::{info_span, Instrument};

use crate::pipeline::queue::QueueReceiver;
use crate::state::StreamState;
use crate::stream::StreamCore;

pub(crate) async fn run(core: Arc<StreamCore>, mut outbound_rx: QueueReceiver) {
    let span = info_span!("outbound_worker", stream_id = %core.id);
    async move {
        let mut shutdown = core.subscribe_shutdown();
        loop {
            let chunk = tokio::select! {
                _ = shutdown.changed() => return,
                maybe = outbound_rx.recv() => match maybe {
                    Some(chunk) => chunk,
                    None => return,
                },
            };

            wait_while_paused(&core, &mut shutdown).await;

            let transport = match core.current_transport().await {
                Some(t) => t,
                None => match core.reconnect_or_fail(None).await {
                    Ok(t) => t,
                    Err(e) => {
                        core.error_tx.publish("outbound", format!("giving up: {e}"));
                        return;
                    }
                },
            };

            if let Err(e) = core.handler.on_outbound(&chunk).await {
                core.error_tx
                    .publish("outbound", format!("handler skipped chunk {}: {e}", chunk.sequence));
                continue;
            }

            match transport.write_chunk(&chunk).await {
                Ok(()) => {}
                Err(e) => {
                    core.error_tx.publish("outbound", format!("write failed: {e}"));
                    match core.reconnect_or_fail(Some(transport.clone())).await {
                        Ok(fresh) => {
                            if let Err(e) = fresh.write_chunk(&chunk).await {
                                core.error_tx.publish(
                                    "outbound",
                                    format!("dropping chunk {} after retry failed: {e}", chunk.sequence),
                                );
                            }
                        }
                        Err(_) => return,
                    }
                }
            }
        }
    }
    .instrument(span)
    .await
}

async fn wait_while_paused(core: &Arc<StreamCore>, shutdown: &mut tokio::sync::watch::Receiver<bool>) {
    let mut state_rx = core.subscribe_state();
    while *state_rx.borrow() == StreamState::Paused {
        tokio::select! {
            _ = shutdown.changed() => return,
            changed = state_rx.changed() => if changed.is_err() { return },
        }
    }
}
