//! The inbound worker: reads chunks off the current transport, hands
//! heartbeats to the liveness tracker, and forwards everything else to the
//! application queue.

use std::sync::Arc;

use tracing::{info_span, Instrument};

use crate::pipeline::queue::QueueSender;
use crate::stream::StreamCore;

pub(crate) async fn run(core: Arc<StreamCore>, inbound_tx: QueueSender) {
    let span = info_span!("inbound_worker", stream_id = %core.id);
    async move {
        let mut shutdown = core.subscribe_shutdown();
        loop {
            let transport = match core.current_transport().await {
                Some(t) => t,
                None => match core.reconnect_or_fail(None).await {
                    Ok(t) => t,
                    Err(e) => {
                        core.error_tx.publish("inbound", format!("giving up: {e}"));
                        return;
                    }
                },
            };

            tokio::select! {
                _ = shutdown.changed() => return,
                result = transport.read_chunk() => {
                    match result {
                        Ok(chunk) => {
                            core.touch_activity().await;
                            if chunk.kind.is_heartbeat() {
                                continue;
                            }
                            match core.handler.on_inbound(chunk).await {
                                Ok(Some(chunk)) => inbound_tx.try_send_or_drop(chunk, "inbound"),
                                Ok(None) => {}
                                Err(e) => core
                                    .error_tx
                                    .publish("inbound", format!("handler rejected chunk: {e}")),
                            }
                        }
                        Err(e) => {
                            core.error_tx.publish("inbound", format!("read failed: {e}"));
                            if core.reconnect_or_fail(Some(transport.clone())).await.is_err() {
                                return;
                            }
                        }
                    }
                }
            }
        }
    }
    .instrument(span)
    .await
}
