//! Monotonic time source for the step loop.
//!
//! Times are `Duration`s since the clock's origin so a virtual clock can
//! stand in for the real one in tests.

use std::sync::Mutex;
use std::thread;
use std::time::{Duration, Instant};

/// Below this remaining time the real clock spins instead of sleeping.
const SPIN_THRESHOLD: Duration = Duration::from_millis(1);

pub trait Clock: Send + Sync {
    /// Time elapsed since the clock's origin.
    fn now(&self) -> Duration;

    /// Block until `now() >= deadline`. Returns at once if the deadline has
    /// already passed.
    fn sleep_until(&self, deadline: Duration);

    fn sleep(&self, duration: Duration) {
        self.sleep_until(self.now() + duration);
    }
}

/// Wall-clock implementation on `Instant`.
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self { origin: Instant::now() }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep_until(&self, deadline: Duration) {
        loop {
            let now = self.now();
            if now >= deadline {
                return;
            }
            let remaining = deadline - now;
            if remaining > SPIN_THRESHOLD {
                thread::sleep(remaining - SPIN_THRESHOLD);
            } else {
                thread::yield_now();
            }
        }
    }
}

/// Virtual clock: sleeping jumps time forward instead of blocking.
///
/// `oversleep` is added to every sleep that actually waits, to model a
/// scheduler that wakes up late.
pub struct ManualClock {
    now: Mutex<Duration>,
    oversleep: Duration,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::with_oversleep(Duration::ZERO)
    }

    pub fn with_oversleep(oversleep: Duration) -> Self {
        Self {
            now: Mutex::new(Duration::ZERO),
            oversleep,
        }
    }

    /// Move time forward without sleeping, e.g. to model processing cost.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn sleep_until(&self, deadline: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        if deadline > *now {
            *now = deadline + self.oversleep;
        }
    }
}
