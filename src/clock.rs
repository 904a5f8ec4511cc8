//! Injectable time source.
//!
//! All sliding-window structures read "now" through a [`Clock`] rather than
//! calling `chrono::Local::now()` directly, so tests can drive an exact
//! sequence of `(now, inputs)` without sleeping.

use std::sync::atomic::{AtomicI64, Ordering};

use chrono::Utc;

/// A monotonic source of wall-clock milliseconds.
pub trait Clock: Send + Sync {
    /// Current time in milliseconds since the Unix epoch.
    fn now_millis(&self) -> i64;
}

/// Production clock backed by the system wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// A clock whose value is set explicitly by the test driving it.
///
/// Never advances on its own; callers move it forward with [`FakeClock::set`]
/// or [`FakeClock::advance`].
#[derive(Debug)]
pub struct FakeClock {
    millis: AtomicI64,
}

impl FakeClock {
    pub fn new(start_millis: i64) -> Self {
        Self {
            millis: AtomicI64::new(start_millis),
        }
    }

    pub fn set(&self, millis: i64) {
        self.millis.store(millis, Ordering::SeqCst);
    }

    pub fn advance(&self, delta_millis: i64) {
        self.millis.fetch_add(delta_millis, Ordering::SeqCst);
    }
}

impl Clock for FakeClock {
    fn now_millis(&self) -> i64 {
        self.millis.load(Ordering::SeqCst)
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new(0)
    }
}
