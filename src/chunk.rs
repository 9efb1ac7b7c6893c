//! The transported unit: a typed media envelope carried over a
//! [`Transport`][crate::transport::Transport].

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The kind of payload a [`Chunk`] carries.
///
/// `Heartbeat` is reserved for the liveness monitor: it is never delivered to
/// application consumers (see [`crate::pipeline::inbound`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkKind {
    Text,
    Audio,
    Video,
    Mixed,
    Heartbeat,
}

impl ChunkKind {
    pub fn is_heartbeat(self) -> bool {
        matches!(self, ChunkKind::Heartbeat)
    }
}

/// A single unit of stream traffic.
///
/// Sequence numbers are assigned by the owning stream at `send()` time and are
/// strictly increasing starting at 1; see invariant 1 in the design.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Opaque correlation identifier, set by the application if needed.
    pub id: Option<String>,
    pub kind: ChunkKind,
    pub payload_bytes: Option<Vec<u8>>,
    pub payload_text: Option<String>,
    /// Wall-clock time assigned by the sender when not preset.
    pub timestamp: DateTime<Utc>,
    /// Monotonically increasing per-stream identifier assigned on send.
    pub sequence: u64,
    pub is_final: bool,
    pub metadata: HashMap<String, Value>,
}

impl Chunk {
    /// Builds an unsent chunk. `sequence` is left at 0 and `timestamp` at the
    /// current time; both are normalized by the stream's `send()` path.
    pub fn new(kind: ChunkKind) -> Self {
        Self {
            id: None,
            kind,
            payload_bytes: None,
            payload_text: None,
            timestamp: Utc::now(),
            sequence: 0,
            is_final: false,
            metadata: HashMap::new(),
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            payload_text: Some(text.into()),
            ..Self::new(ChunkKind::Text)
        }
    }

    pub fn bytes(kind: ChunkKind, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            payload_bytes: Some(bytes.into()),
            ..Self::new(kind)
        }
    }

    pub(crate) fn heartbeat() -> Self {
        let mut chunk = Self::new(ChunkKind::Heartbeat);
        chunk
            .metadata
            .insert("ping".to_string(), Value::Bool(true));
        chunk
    }

    pub fn with_final(mut self, is_final: bool) -> Self {
        self.is_final = is_final;
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}
