//! Serial-link keepalive.
//!
//! The device drops a serial client it has not heard from in a while, so the
//! engine sends a heartbeat once per interval. The timer only advances when a
//! heartbeat actually went out; a failed send is retried on the next tick.

use std::time::Duration;
use tokio::time::Instant;

/// Default heartbeat interval
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(60);

/// Tracks when the next heartbeat is due
#[derive(Debug, Clone)]
pub struct HeartbeatKeeper {
    interval: Duration,
    last_sent: Instant,
    sequence: u32,
}

impl HeartbeatKeeper {
    /// Start the interval at `now`
    pub fn new(interval: Duration, now: Instant) -> Self {
        Self {
            interval,
            last_sent: now,
            sequence: 0,
        }
    }

    /// Interval between heartbeats
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Time of the last successful heartbeat
    pub fn last_sent(&self) -> Instant {
        self.last_sent
    }

    /// A heartbeat is due at `now`
    pub fn is_due(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.last_sent) >= self.interval
    }

    /// Nonce for the next heartbeat
    pub fn next_nonce(&mut self) -> u32 {
        self.sequence = self.sequence.wrapping_add(1);
        self.sequence
    }

    /// Record a successful send
    pub fn mark_sent(&mut self, now: Instant) {
        self.last_sent = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_due_after_interval() {
        let start = Instant::now();
        let keeper = HeartbeatKeeper::new(Duration::from_secs(60), start);

        assert!(!keeper.is_due(start));
        assert!(!keeper.is_due(start + Duration::from_secs(59)));
        assert!(keeper.is_due(start + Duration::from_secs(60)));
    }

    #[test]
    fn test_one_heartbeat_per_interval() {
        let start = Instant::now();
        let mut keeper = HeartbeatKeeper::new(Duration::from_secs(60), start);

        let mut sent = 0;
        for second in 0..=185 {
            let now = start + Duration::from_secs(second);
            if keeper.is_due(now) {
                keeper.mark_sent(now);
                sent += 1;
            }
        }
        assert_eq!(sent, 3);
    }

    #[test]
    fn test_failed_send_stays_due() {
        let start = Instant::now();
        let keeper = HeartbeatKeeper::new(Duration::from_secs(60), start);
        let late = start + Duration::from_secs(61);

        // Nothing marked: still due on the following tick
        assert!(keeper.is_due(late));
        assert!(keeper.is_due(late + Duration::from_secs(1)));
    }

    #[test]
    fn test_nonces_differ() {
        let mut keeper = HeartbeatKeeper::new(DEFAULT_HEARTBEAT_INTERVAL, Instant::now());
        let first = keeper.next_nonce();
        assert_ne!(first, keeper.next_nonce());
    }
}
