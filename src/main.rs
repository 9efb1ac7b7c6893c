//! A minimal demo binary: starts a stream over an in-memory echo transport,
//! sends a handful of chunks, logs what comes back, then waits for a
//! shutdown signal.

use std::sync::Arc;

use tokio::signal;
use tracing::info;

use bistream::chunk::Chunk;
use bistream::logging::LogConfig;
use bistream::stream::BidirectionalStreamBuilder;
use bistream::transport::MemoryTransport;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _guard = LogConfig::default().init();

    let stream = Arc::new(
        BidirectionalStreamBuilder::new()
            .id("demo")
            .transport(Box::new(MemoryTransport::echo(32)))
            .build(),
    );
    stream.start().await?;
    info!(id = stream.id(), "stream started");

    for text in ["hello", "from", "bistream"] {
        stream.send(Chunk::text(text))?;
    }

    let reader = stream.clone();
    tokio::spawn(async move {
        while let Some(chunk) = reader.recv().await {
            info!(?chunk.payload_text, sequence = chunk.sequence, "received chunk");
        }
    });

    shutdown_signal().await;
    stream.close().await?;
    info!("stream closed, exiting");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("ctrl_c signal received"),
        _ = terminate => info!("terminate signal received"),
    }
}
