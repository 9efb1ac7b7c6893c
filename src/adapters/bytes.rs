//! A thin facade treating a stream as one continuous byte stream instead of
//! discrete chunks, buffering the residue of partially consumed chunks
//! between calls.
//!
//! Per the wire shape, a byte write travels as a `Text`-kind chunk carrying
//! `payload_bytes` rather than `payload_text`; there is no distinct
//! "raw bytes" chunk kind, so [`ByteWriter`] reuses `Text` the way any other
//! non-text-kind payload would ride along in `payload_bytes`.

use std::io;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::chunk::{Chunk, ChunkKind};
use crate::error::StreamError;
use crate::stream::BidirectionalStream;

pub struct ByteReader {
    stream: Arc<BidirectionalStream>,
    residual: Mutex<Vec<u8>>,
}

impl ByteReader {
    pub fn new(stream: Arc<BidirectionalStream>) -> Self {
        Self {
            stream,
            residual: Mutex::new(Vec::new()),
        }
    }

    /// Fills `buf` from any buffered residue first, then from the next
    /// chunk carrying a byte payload. Returns `0` once the stream has no
    /// more chunks.
    pub async fn read(&self, buf: &mut [u8]) -> io::Result<usize> {
        let mut residual = self.residual.lock().await;
        if residual.is_empty() {
            loop {
                let Some(chunk) = self.stream.recv().await else {
                    return Ok(0);
                };
                if let Some(bytes) = chunk.payload_bytes {
                    *residual = bytes;
                    break;
                }
            }
        }

        let take = buf.len().min(residual.len());
        buf[..take].copy_from_slice(&residual[..take]);
        residual.drain(..take);
        Ok(take)
    }
}

pub struct ByteWriter {
    stream: Arc<BidirectionalStream>,
}

impl ByteWriter {
    pub fn new(stream: Arc<BidirectionalStream>) -> Self {
        Self { stream }
    }

    pub fn write(&self, data: &[u8]) -> Result<(), StreamError> {
        self.stream.send(Chunk::bytes(ChunkKind::Text, data.to_vec()))
    }

    /// Marks the final chunk of the byte stream.
    pub fn write_final(&self, data: &[u8]) -> Result<(), StreamError> {
        self.stream
            .send(Chunk::bytes(ChunkKind::Text, data.to_vec()).with_final(true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::BidirectionalStreamBuilder;
    use crate::transport::MemoryTransport;

    #[tokio::test]
    async fn read_splits_a_single_written_chunk_across_multiple_small_reads() {
        let stream = Arc::new(
            BidirectionalStreamBuilder::new()
                .transport(Box::new(MemoryTransport::echo(4)))
                .build(),
        );
        stream.start().await.unwrap();

        let writer = ByteWriter::new(stream.clone());
        writer.write(b"hello world").unwrap();

        let reader = ByteReader::new(stream);
        let mut first = [0u8; 5];
        assert_eq!(reader.read(&mut first).await.unwrap(), 5);
        assert_eq!(&first, b"hello");

        let mut second = [0u8; 6];
        assert_eq!(reader.read(&mut second).await.unwrap(), 6);
        assert_eq!(&second, b" world");
    }

    #[tokio::test]
    async fn write_final_marks_is_final_on_the_underlying_chunk() {
        let (a, b) = MemoryTransport::pair(4);
        let writer_stream = Arc::new(
            BidirectionalStreamBuilder::new()
                .transport(Box::new(a))
                .build(),
        );
        let reader_stream = Arc::new(
            BidirectionalStreamBuilder::new()
                .transport(Box::new(b))
                .build(),
        );
        writer_stream.start().await.unwrap();
        reader_stream.start().await.unwrap();

        ByteWriter::new(writer_stream).write_final(b"done").unwrap();
        let chunk = reader_stream.recv().await.unwrap();
        assert!(chunk.is_final);
        assert_eq!(chunk.payload_bytes.as_deref(), Some(b"done".as_slice()));
    }
}
