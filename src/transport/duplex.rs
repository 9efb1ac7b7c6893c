//! A [`Transport`] over any split async byte stream (TCP, a Unix socket, an
//! in-process duplex pipe, ...), framed with [`ChunkCodec`].

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::Mutex;
use tokio_util::codec::{FramedRead, FramedWrite};

use crate::chunk::Chunk;
use crate::error::TransportError;

use super::codec::ChunkCodec;
use super::Transport;

/// Wraps a split reader/writer pair in [`ChunkCodec`] framing.
///
/// `R` and `W` are typically the two halves of [`tokio::io::split`] over a
/// single stream, but any independently owned reader/writer pair works.
pub struct DuplexTransport<R, W> {
    reader: Mutex<FramedRead<R, ChunkCodec>>,
    writer: Mutex<FramedWrite<W, ChunkCodec>>,
    closed: AtomicBool,
}

impl<R, W> DuplexTransport<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader: Mutex::new(FramedRead::new(reader, ChunkCodec::new())),
            writer: Mutex::new(FramedWrite::new(writer, ChunkCodec::new())),
            closed: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl<R, W> Transport for DuplexTransport<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn read_chunk(&self) -> Result<Chunk, TransportError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(TransportError::Closed);
        }
        let mut reader = self.reader.lock().await;
        match reader.next().await {
            Some(Ok(chunk)) => Ok(chunk),
            Some(Err(e)) => Err(e),
            None => Err(TransportError::Closed),
        }
    }

    async fn write_chunk(&self, chunk: &Chunk) -> Result<(), TransportError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(TransportError::Closed);
        }
        let mut writer = self.writer.lock().await;
        writer.send(chunk.clone()).await
    }

    async fn close(&self) -> Result<(), TransportError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        let mut writer = self.writer.lock().await;
        writer.close().await
    }

    fn is_alive(&self) -> bool {
        !self.closed.load(Ordering::Acquire)
    }
}
