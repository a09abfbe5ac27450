//! Fixed period ticker
//!
//! The ticker owns no thread. It holds the deadline of the next tick, which the executive's event
//! loop polls. Cancelling the ticker clears the deadline, so no tick can fire after `cancel`
//! returns.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::time::{Duration, Instant};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Ticker {
    period: Duration,

    /// Deadline of the next tick, `None` if the ticker is not armed.
    next_due: Option<Instant>,

    /// Number of ticks fired since the ticker was last armed.
    num_ticks: u64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Ticker {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            next_due: None,
            num_ticks: 0,
        }
    }

    /// Arm the ticker so the first tick is due one period after `now`.
    pub fn arm(&mut self, now: Instant) {
        self.next_due = Some(now + self.period);
        self.num_ticks = 0;
    }

    /// Disarm the ticker.
    pub fn cancel(&mut self) {
        self.next_due = None;
    }

    pub fn is_armed(&self) -> bool {
        self.next_due.is_some()
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.next_due
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn num_ticks(&self) -> u64 {
        self.num_ticks
    }

    /// Returns true, and schedules the following tick, if a tick is due at `now`.
    ///
    /// If the caller has fallen more than one period behind the missed ticks are dropped rather
    /// than fired in a burst.
    pub fn poll(&mut self, now: Instant) -> bool {
        let due = match self.next_due {
            Some(d) if d <= now => d,
            _ => return false
        };

        let mut next = due + self.period;
        if next <= now {
            next = now + self.period;
        }

        self.next_due = Some(next);
        self.num_ticks += 1;

        true
    }

    /// Time remaining until the next tick, zero if it is already due, `None` if not armed.
    pub fn time_until_due(&self, now: Instant) -> Option<Duration> {
        self.next_due.map(|d| d.saturating_duration_since(now))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_ticker() {
        let period = Duration::from_millis(100);
        let mut t = Ticker::new(period);
        let t0 = Instant::now();

        // Not armed, never fires
        assert!(!t.poll(t0 + period * 10));
        assert_eq!(t.time_until_due(t0), None);

        t.arm(t0);
        assert!(!t.poll(t0));
        assert!(!t.poll(t0 + Duration::from_millis(99)));
        assert!(t.poll(t0 + period));
        assert!(!t.poll(t0 + period));
        assert!(t.poll(t0 + period * 2));
        assert_eq!(t.num_ticks(), 2);
        assert_eq!(t.time_until_due(t0 + period * 2), Some(period));

        // Falling behind drops the missed ticks
        assert!(t.poll(t0 + period * 10));
        assert!(!t.poll(t0 + period * 10 + Duration::from_millis(50)));
        assert_eq!(t.next_due(), Some(t0 + period * 11));

        t.cancel();
        assert!(!t.is_armed());
        assert!(!t.poll(t0 + period * 100));
    }
}
