//! Typed stream options.
//!
//! This is data only. Loading from TOML/env and hot-reload are an external
//! application's concern (see the host framework's `figment`-based
//! `ServerConfig` for that layer, which this crate deliberately does not
//! reproduce).

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Capacity of the inbound and outbound queues, in chunks.
    pub buffer_size: usize,
    /// Whether the liveness monitor (heartbeat worker) runs at all.
    pub heartbeat_enabled: bool,
    /// Period between outbound heartbeat chunks.
    pub heartbeat_interval: Duration,
    /// Additional grace beyond `heartbeat_interval` before peer silence is
    /// declared.
    pub heartbeat_timeout: Duration,
    /// Initial backoff between reconnect attempts.
    pub reconnect_delay_base: Duration,
    /// Maximum backoff; caps the exponential growth.
    pub reconnect_delay_cap: Duration,
    /// Bound on consecutive reconnect attempts before terminal failure.
    pub max_reconnects: u32,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            buffer_size: 256,
            heartbeat_enabled: true,
            heartbeat_interval: Duration::from_secs(15),
            heartbeat_timeout: Duration::from_secs(10),
            reconnect_delay_base: Duration::from_millis(500),
            reconnect_delay_cap: Duration::from_secs(30),
            max_reconnects: 5,
        }
    }
}
