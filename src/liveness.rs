//! Heartbeat emission and peer-silence detection.
//!
//! The two concerns are deliberately kept on one ticker but treated as
//! independent outcomes: a failed heartbeat send is diagnostic only and
//! never triggers reconnection on its own (a blip on our send side says
//! nothing about whether the peer is still there); only the silence
//! detector below, which judges purely by elapsed time since the last
//! successful read, gets to invoke reconnection.

use std::sync::Arc;

use tracing::{info_span, Instrument};

use crate::chunk::Chunk;
use crate::error::StreamError;
use crate::stream::StreamCore;

pub(crate) async fn run(core: Arc<StreamCore>) {
    let span = info_span!("liveness_worker", stream_id = %core.id);
    async move {
        let mut shutdown = core.subscribe_shutdown();
        let mut ticker = tokio::time::interval(core.config.heartbeat_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.changed() => return,
                _ = ticker.tick() => {
                    send_heartbeat(&core).await;
                    if check_silence(&core).await.is_err() {
                        return;
                    }
                }
            }
        }
    }
    .instrument(span)
    .await
}

async fn send_heartbeat(core: &Arc<StreamCore>) {
    let Some(transport) = core.current_transport().await else {
        return;
    };
    if let Err(e) = transport.write_chunk(&Chunk::heartbeat()).await {
        let err = StreamError::HeartbeatFailed(e);
        core.error_tx.publish("heartbeat", err.to_string());
    }
}

async fn check_silence(core: &Arc<StreamCore>) -> Result<(), ()> {
    let threshold = core.config.heartbeat_interval + core.config.heartbeat_timeout;
    let silence = core.silence_duration().await;
    if silence <= threshold {
        return Ok(());
    }
    core.error_tx.publish("heartbeat", StreamError::HeartbeatTimeout.to_string());
    let suspect = core.current_transport().await;
    core.reconnect_or_fail(suspect).await.map(|_| ()).map_err(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::BidirectionalStreamBuilder;
    use crate::transport::MemoryTransport;
    use std::time::Duration;

    /// A heartbeat write failure alone must not force the stream out of
    /// `Streaming`; only sustained silence does.
    #[tokio::test]
    async fn a_lone_heartbeat_write_failure_does_not_force_reconnection() {
        struct WriteFailsTransport;

        #[async_trait::async_trait]
        impl crate::transport::Transport for WriteFailsTransport {
            async fn read_chunk(&self) -> Result<Chunk, crate::error::TransportError> {
                std::future::pending().await
            }
            async fn write_chunk(&self, _chunk: &Chunk) -> Result<(), crate::error::TransportError> {
                Err(crate::error::TransportError::Io(std::io::Error::new(
                    std::io::ErrorKind::BrokenPipe,
                    "write failed",
                )))
            }
            async fn close(&self) -> Result<(), crate::error::TransportError> {
                Ok(())
            }
            fn is_alive(&self) -> bool {
                true
            }
        }

        let stream = Arc::new(
            BidirectionalStreamBuilder::new()
                .config(crate::config::StreamConfig {
                    heartbeat_enabled: true,
                    heartbeat_interval: Duration::from_millis(15),
                    heartbeat_timeout: Duration::from_secs(60),
                    ..crate::config::StreamConfig::default()
                })
                .transport(Box::new(WriteFailsTransport))
                .build(),
        );
        stream.start().await.unwrap();

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(stream.get_state(), crate::state::StreamState::Streaming);
        stream.close().await.unwrap();
    }

    #[tokio::test]
    async fn heartbeats_are_not_delivered_to_the_application_queue() {
        let stream = Arc::new(
            BidirectionalStreamBuilder::new()
                .config(crate::config::StreamConfig {
                    heartbeat_enabled: true,
                    heartbeat_interval: Duration::from_millis(10),
                    heartbeat_timeout: Duration::from_secs(60),
                    ..crate::config::StreamConfig::default()
                })
                .transport(Box::new(MemoryTransport::echo(32)))
                .build(),
        );
        stream.start().await.unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;
        // Nothing should be sitting in the inbound queue: every echoed
        // heartbeat must have been filtered before delivery.
        let result = tokio::time::timeout(Duration::from_millis(20), stream.recv()).await;
        assert!(result.is_err(), "no heartbeat chunk should reach recv()");
        stream.close().await.unwrap();
    }
}
