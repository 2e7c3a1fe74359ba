//! Per-engine operation counters.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default)]
pub(crate) struct EngineStats {
    starts: AtomicU64,
    stops: AtomicU64,
    noop_stops: AtomicU64,
    claims: AtomicU64,
    failures: AtomicU64,
    skewed: AtomicU64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub starts: u64,
    pub stops: u64,
    pub noop_stops: u64,
    pub claims: u64,
    pub failures: u64,
    /// Settlements where the clock was behind the checkpoint.
    pub skewed: u64,
}

#[derive(Clone, Copy, Debug)]
pub(crate) enum Counter {
    Start,
    Stop,
    NoopStop,
    Claim,
    Failure,
    Skewed,
}

impl EngineStats {
    pub(crate) fn bump(&self, counter: Counter) {
        let cell = match counter {
            Counter::Start => &self.starts,
            Counter::Stop => &self.stops,
            Counter::NoopStop => &self.noop_stops,
            Counter::Claim => &self.claims,
            Counter::Failure => &self.failures,
            Counter::Skewed => &self.skewed,
        };
        cell.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            starts: self.starts.load(Ordering::Relaxed),
            stops: self.stops.load(Ordering::Relaxed),
            noop_stops: self.noop_stops.load(Ordering::Relaxed),
            claims: self.claims.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            skewed: self.skewed.load(Ordering::Relaxed),
        }
    }
}
