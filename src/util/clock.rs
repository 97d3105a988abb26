//! Clock sources used to decide worker and task eligibility.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use super::serde::Timestamp;

/// Current wall-clock time in milliseconds since the UNIX epoch.
#[must_use]
pub fn now_ms() -> Timestamp {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

/// Source of "now" for the plant.
///
/// All worker windows and task start times are interpreted against the value
/// returned here, and the alarm thread converts the distance to the next
/// deadline into a real timed wait.
pub trait Clock: Send + Sync + 'static {
    /// Current time in milliseconds.
    fn now(&self) -> Timestamp;
}

/// Wall clock backed by [`SystemTime`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        now_ms()
    }
}

/// Clock that only moves when told to.
///
/// Useful for driving the plant deterministically; pair it with
/// `Plant::tick` after moving time forward.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    /// Create a clock frozen at `start`.
    #[must_use]
    pub const fn new(start: Timestamp) -> Self {
        Self {
            now: AtomicU64::new(start),
        }
    }

    /// Jump to an absolute time.
    pub fn set(&self, now: Timestamp) {
        self.now.store(now, Ordering::Release);
    }

    /// Move time forward by `delta` milliseconds and return the new time.
    pub fn advance(&self, delta: u64) -> Timestamp {
        self.now.fetch_add(delta, Ordering::AcqRel).saturating_add(delta)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        self.now.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_is_monotonic_enough() {
        let clock = SystemClock;
        let a = clock.now();
        let b = clock.now();
        assert!(a > 0);
        assert!(b >= a);
    }

    #[test]
    fn test_manual_clock_set_and_advance() {
        let clock = ManualClock::new(10);
        assert_eq!(clock.now(), 10);

        assert_eq!(clock.advance(5), 15);
        assert_eq!(clock.now(), 15);

        clock.set(100);
        assert_eq!(clock.now(), 100);
    }
}
