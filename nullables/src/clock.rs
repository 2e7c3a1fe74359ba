//! Nullable clock: deterministic time for testing.

use guru_types::{Clock, Timestamp};
use std::sync::atomic::{AtomicU64, Ordering};

/// A deterministic clock for testing.
///
/// Time only advances when you tell it to. Shareable across threads, so
/// concurrency tests can read the same instant from every worker.
pub struct NullClock {
    current_millis: AtomicU64,
}

impl NullClock {
    pub fn new(initial_secs: u64) -> Self {
        Self::from_millis(initial_secs.saturating_mul(1000))
    }

    pub fn from_millis(initial_millis: u64) -> Self {
        Self {
            current_millis: AtomicU64::new(initial_millis),
        }
    }

    /// Advance time by a number of seconds.
    pub fn advance(&self, secs: u64) {
        self.advance_millis(secs.saturating_mul(1000));
    }

    pub fn advance_millis(&self, millis: u64) {
        self.current_millis.fetch_add(millis, Ordering::SeqCst);
    }

    /// Move time backwards, as a misbehaving wall clock would.
    pub fn rewind(&self, secs: u64) {
        let millis = secs.saturating_mul(1000);
        let _ = self
            .current_millis
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |t| {
                Some(t.saturating_sub(millis))
            });
    }

    /// Set the time to a specific value in seconds.
    pub fn set(&self, secs: u64) {
        self.current_millis
            .store(secs.saturating_mul(1000), Ordering::SeqCst);
    }
}

impl Clock for NullClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_millis(self.current_millis.load(Ordering::SeqCst))
    }
}
