//! Reconnection backoff math.
//!
//! Mirrors the shape of the host ecosystem's `StreamReconnectionManager`
//! (exponential backoff with a cap, tracked attempt count) but drops its
//! jitter term: the distilled delay formula is exactly
//! `min(base * 2^(attempt - 1), cap)`, and no jitter source is specified.

use std::time::Duration;

use crate::config::StreamConfig;

/// Tracks reconnect attempts for one stream and computes the delay before
/// the next one.
#[derive(Debug, Default)]
pub struct ReconnectController {
    attempts: u32,
}

impl ReconnectController {
    pub fn new() -> Self {
        Self { attempts: 0 }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn reset(&mut self) {
        self.attempts = 0;
    }

    /// `true` while another attempt is still within the configured budget.
    pub fn should_reconnect(&self, config: &StreamConfig) -> bool {
        self.attempts < config.max_reconnects
    }

    /// Records an attempt and returns the delay to wait before making it.
    ///
    /// The first attempt (attempt 1) waits `reconnect_delay_base`; each
    /// subsequent attempt doubles the previous delay, capped at
    /// `reconnect_delay_cap`.
    pub fn next_delay(&mut self, config: &StreamConfig) -> Duration {
        self.attempts += 1;
        backoff_delay(
            self.attempts,
            config.reconnect_delay_base,
            config.reconnect_delay_cap,
        )
    }
}

/// `min(base * 2^(attempt - 1), cap)`, saturating rather than overflowing
/// for large attempt counts.
fn backoff_delay(attempt: u32, base: Duration, cap: Duration) -> Duration {
    let exponent = attempt.saturating_sub(1).min(32);
    let multiplier = 1u64.checked_shl(exponent).unwrap_or(u64::MAX);
    let scaled = base
        .as_millis()
        .min(u128::from(u64::MAX))
        .saturating_mul(u128::from(multiplier));
    let scaled = Duration::from_millis(scaled.min(u128::from(u64::MAX)) as u64);
    scaled.min(cap)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> StreamConfig {
        StreamConfig {
            reconnect_delay_base: Duration::from_millis(500),
            reconnect_delay_cap: Duration::from_secs(30),
            max_reconnects: 5,
            ..StreamConfig::default()
        }
    }

    #[test]
    fn delay_doubles_each_attempt_until_the_cap() {
        let mut controller = ReconnectController::new();
        let config = config();

        assert_eq!(controller.next_delay(&config), Duration::from_millis(500));
        assert_eq!(controller.next_delay(&config), Duration::from_millis(1000));
        assert_eq!(controller.next_delay(&config), Duration::from_millis(2000));
        assert_eq!(controller.next_delay(&config), Duration::from_millis(4000));
    }

    #[test]
    fn delay_saturates_at_the_cap_instead_of_growing_forever() {
        let mut controller = ReconnectController::new();
        let config = config();
        for _ in 0..10 {
            controller.next_delay(&config);
        }
        assert_eq!(controller.next_delay(&config), config.reconnect_delay_cap);
    }

    #[test]
    fn should_reconnect_respects_the_attempt_budget() {
        let mut controller = ReconnectController::new();
        let config = config();
        for _ in 0..config.max_reconnects {
            assert!(controller.should_reconnect(&config));
            controller.next_delay(&config);
        }
        assert!(!controller.should_reconnect(&config));
    }

    #[test]
    fn reset_clears_attempt_count() {
        let mut controller = ReconnectController::new();
        let config = config();
        controller.next_delay(&config);
        controller.next_delay(&config);
        controller.reset();
        assert_eq!(controller.attempts(), 0);
        assert_eq!(controller.next_delay(&config), Duration::from_millis(500));
    }
}
