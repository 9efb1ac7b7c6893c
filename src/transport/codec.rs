//! Length-prefixed JSON framing for [`Chunk`]s.
//!
//! Built the way the host framework's `compress_cbor_codec` builds a
//! [`tokio_util::codec`] pair: a fixed-size length header followed by the
//! payload, with an [`AdaptiveBuffer`] as reusable encode scratch space. The
//! payload format differs (plain JSON rather than CBOR+Zstd) because this
//! wire format favors debuggability over the host framework's bandwidth
//! concerns, and binary fields are base64-encoded inline so the whole frame
//! stays valid JSON.

use std::collections::HashMap;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use bytes::{Buf, BufMut, BytesMut};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_util::codec::{Decoder, Encoder};

use crate::chunk::{Chunk, ChunkKind};
use crate::error::TransportError;
use crate::utils::adaptive_buffer::AdaptiveBuffer;

/// Header width, bytes. The frame body length follows as a big-endian u32.
const LEN_HEADER: usize = 4;

/// Refuse to allocate for a claimed frame bigger than this; guards against a
/// corrupt or hostile length header turning into an unbounded allocation.
const MAX_FRAME_LEN: u32 = 64 * 1024 * 1024;

/// On-the-wire shape of a [`Chunk`]: identical except `payload_bytes` is a
/// base64 string instead of a JSON array of numbers.
#[derive(Serialize, Deserialize)]
struct WireChunk {
    id: Option<String>,
    kind: ChunkKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    payload_bytes: Option<String>,
    payload_text: Option<String>,
    timestamp: DateTime<Utc>,
    sequence: u64,
    is_final: bool,
    metadata: HashMap<String, Value>,
}

impl From<&Chunk> for WireChunk {
    fn from(chunk: &Chunk) -> Self {
        Self {
            id: chunk.id.clone(),
            kind: chunk.kind,
            payload_bytes: chunk.payload_bytes.as_ref().map(|b| BASE64.encode(b)),
            payload_text: chunk.payload_text.clone(),
            timestamp: chunk.timestamp,
            sequence: chunk.sequence,
            is_final: chunk.is_final,
            metadata: chunk.metadata.clone(),
        }
    }
}

impl TryFrom<WireChunk> for Chunk {
    type Error = TransportError;

    fn try_from(wire: WireChunk) -> Result<Self, Self::Error> {
        let payload_bytes = wire
            .payload_bytes
            .map(|encoded| {
                BASE64
                    .decode(encoded)
                    .map_err(|e| TransportError::Decode(format!("invalid base64 payload: {e}")))
            })
            .transpose()?;
        Ok(Chunk {
            id: wire.id,
            kind: wire.kind,
            payload_bytes,
            payload_text: wire.payload_text,
            timestamp: wire.timestamp,
            sequence: wire.sequence,
            is_final: wire.is_final,
            metadata: wire.metadata,
        })
    }
}

/// A [`tokio_util::codec::Encoder`]/[`Decoder`] pair for [`Chunk`]s.
pub struct ChunkCodec {
    scratch: AdaptiveBuffer<u8>,
}

impl ChunkCodec {
    pub fn new() -> Self {
        Self {
            scratch: AdaptiveBuffer::new(),
        }
    }
}

impl Default for ChunkCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder<Chunk> for ChunkCodec {
    type Error = TransportError;

    fn encode(&mut self, chunk: Chunk, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let wire = WireChunk::from(&chunk);
        serde_json::to_writer(self.scratch.as_mut_vec(), &wire)
            .map_err(|e| TransportError::Decode(format!("failed to encode chunk: {e}")))?;

        let len = self.scratch.len() as u32;
        dst.reserve(LEN_HEADER + self.scratch.len());
        dst.put_u32(len);
        dst.extend_from_slice(&self.scratch);
        self.scratch.finish();
        Ok(())
    }
}

impl Decoder for ChunkCodec {
    type Item = Chunk;
    type Error = TransportError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() < LEN_HEADER {
            return Ok(None);
        }
        let len = u32::from_be_bytes(src[..LEN_HEADER].try_into().unwrap());
        if len > MAX_FRAME_LEN {
            return Err(TransportError::Decode(format!(
                "frame length {len} exceeds the {MAX_FRAME_LEN} byte cap"
            )));
        }
        let total = LEN_HEADER + len as usize;
        if src.len() < total {
            src.reserve(total - src.len());
            return Ok(None);
        }

        src.advance(LEN_HEADER);
        let body = src.split_to(len as usize);
        let wire: WireChunk = serde_json::from_slice(&body)
            .map_err(|e| TransportError::Decode(format!("malformed chunk frame: {e}")))?;
        Ok(Some(Chunk::try_from(wire)?))
    }
}
