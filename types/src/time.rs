//! Timestamps and the clock abstraction.
//!
//! Timestamps are Unix epoch seconds (UTC). The ledger never reads the wall
//! clock itself: every time-gated operation takes `now` as an argument, and
//! only the outermost layers obtain it from a [`Clock`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// A Unix timestamp in seconds since epoch (UTC).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    pub const fn new(secs: u64) -> Self {
        Self(secs)
    }

    pub fn as_secs(&self) -> u64 {
        self.0
    }

    /// This timestamp shifted forward by `secs`, saturating at `u64::MAX`.
    pub fn plus_secs(&self, secs: u64) -> Timestamp {
        Self(self.0.saturating_add(secs))
    }

    /// Seconds from `now` until this timestamp, zero once it has passed.
    pub fn secs_until(&self, now: Timestamp) -> u64 {
        self.0.saturating_sub(now.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s", self.0)
    }
}

/// Source of the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall-clock time from the operating system.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Timestamp(secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plus_secs_saturates() {
        assert_eq!(Timestamp::new(u64::MAX - 1).plus_secs(10).as_secs(), u64::MAX);
        assert_eq!(Timestamp::new(100).plus_secs(300).as_secs(), 400);
    }

    #[test]
    fn secs_until_is_zero_in_the_past() {
        let end = Timestamp::new(1_000);
        assert_eq!(end.secs_until(Timestamp::new(400)), 600);
        assert_eq!(end.secs_until(Timestamp::new(1_000)), 0);
        assert_eq!(end.secs_until(Timestamp::new(5_000)), 0);
    }

    #[test]
    fn system_clock_is_after_2020() {
        assert!(SystemClock.now().as_secs() > 1_577_836_800);
    }
}
