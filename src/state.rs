//! Stream lifecycle state machine.
//!
//! ```text
//! Disconnected ──Start────────────▶ Connecting
//! Connecting   ──transport ok─────▶ Connected ──worker start─▶ Streaming
//! Connecting   ──transport fail───▶ Error (terminal)
//! Streaming    ──I/O error────────▶ Connecting (via reconnect)
//! Streaming    ──reconnect budget exhausted─▶ Error
//! Streaming    ──peer silence timeout──────▶ Connecting (via reconnect)
//! Streaming    ──Pause────────────▶ Paused
//! Paused       ──Resume───────────▶ Streaming
//! Any          ──Close────────────▶ Disconnected (terminal)
//! ```

use std::fmt;

/// Observable lifecycle state of a [`BidirectionalStream`][crate::stream::BidirectionalStream].
///
/// `Disconnected` is both the initial state and the terminal state reached by
/// `Close`. `Error` is terminal and unreachable from itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum StreamState {
    Disconnected,
    Connecting,
    Connected,
    Streaming,
    Paused,
    Error,
}

impl StreamState {
    /// Only `Error` (reconnect exhausted, no transport configured) is
    /// terminal in the lifecycle sense of "no further transitions". Closing
    /// a stream also lands it on `Disconnected`, the same value as the
    /// initial state, but that's a property of [`BidirectionalStream`]'s
    /// one-shot `start()` guard, not of this state on its own.
    pub fn is_terminal(self) -> bool {
        matches!(self, StreamState::Error)
    }
}

impl Default for StreamState {
    fn default() -> Self {
        StreamState::Disconnected
    }
}

impl fmt::Debug for StateChangeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateChangeEvent")
            .field("from", &self.from)
            .field("to", &self.to)
            .finish()
    }
}

/// A single observed transition, passed to `on_state_change` listeners.
#[derive(Clone, Copy)]
pub struct StateChangeEvent {
    pub from: StreamState,
    pub to: StreamState,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_state_is_disconnected() {
        assert_eq!(StreamState::default(), StreamState::Disconnected);
    }

    #[test]
    fn only_error_is_terminal() {
        for state in [
            StreamState::Disconnected,
            StreamState::Connecting,
            StreamState::Connected,
            StreamState::Streaming,
            StreamState::Paused,
        ] {
            assert!(!state.is_terminal(), "{state} should not be terminal");
        }
        assert!(StreamState::Error.is_terminal());
    }
}
