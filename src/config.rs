//! Process-wide timing configuration shared by the relay and both peers.

use std::time::Duration;

/// Simulated transit time applied to every message, in milliseconds.
pub const DEFAULT_MESSAGE_DELAY_MS: u64 = 700;
/// Number of one-second ticks the compute peer waits for storage before giving up.
pub const COUNTDOWN_TICKS: u32 = 10;
pub const COUNTDOWN_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Delay applied before each outbound message is delivered.
    pub message_delay: Duration,
    /// Ticks in the storage-disconnect countdown.
    pub countdown_ticks: u32,
    /// Interval between countdown ticks.
    pub countdown_interval: Duration,
}

impl Timing {
    pub fn with_message_delay_ms(ms: u64) -> Self {
        Self {
            message_delay: Duration::from_millis(ms),
            ..Self::default()
        }
    }
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            message_delay: Duration::from_millis(DEFAULT_MESSAGE_DELAY_MS),
            countdown_ticks: COUNTDOWN_TICKS,
            countdown_interval: COUNTDOWN_INTERVAL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timing() {
        let timing = Timing::default();
        assert_eq!(timing.message_delay, Duration::from_millis(700));
        assert_eq!(timing.countdown_ticks, 10);
        assert_eq!(timing.countdown_interval, Duration::from_secs(1));
    }

    #[test]
    fn test_message_delay_override_keeps_countdown() {
        let timing = Timing::with_message_delay_ms(5);
        assert_eq!(timing.message_delay, Duration::from_millis(5));
        assert_eq!(timing.countdown_ticks, COUNTDOWN_TICKS);
    }
}
