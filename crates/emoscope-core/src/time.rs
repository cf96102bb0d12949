//! Session clocks
//!
//! The aggregator works in whole seconds elapsed since the session anchor.
//! Clocks are injectable so tests drive time by hand.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Monotonic time source for a session
pub trait SessionClock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall-clock source backed by [`Instant::now`]
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SessionClock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Hand-driven clock; clones share the same time
#[derive(Debug, Clone)]
pub struct ManualClock {
    current: Arc<Mutex<Instant>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::starting_at(Instant::now())
    }

    pub fn starting_at(start: Instant) -> Self {
        ManualClock {
            current: Arc::new(Mutex::new(start)),
        }
    }

    /// Move time forward; never backwards
    pub fn advance(&self, dt: Duration) {
        let mut current = self.current.lock();
        *current += dt;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionClock for ManualClock {
    fn now(&self) -> Instant {
        *self.current.lock()
    }
}

/// Whole seconds from `anchor` to `now`, floored; zero if `now` is earlier
#[inline]
pub fn elapsed_secs(anchor: Instant, now: Instant) -> u64 {
    now.saturating_duration_since(anchor).as_secs()
}
