//! Time source abstraction.
//!
//! The pure algorithm layer never calls `SystemTime::now()` directly, so
//! tests can hold time fixed while exercising compose/rebase/confirm.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// A source of milliseconds-since-epoch timestamps.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

/// The real wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0)
    }
}

/// A clock that returns a fixed, manually-advanced value. Used in tests
/// that need deterministic `createdAt` timestamps.
#[derive(Debug)]
pub struct FixedClock(AtomicI64);

impl FixedClock {
    pub fn new(initial_millis: i64) -> Self {
        Self(AtomicI64::new(initial_millis))
    }

    pub fn advance(&self, delta_millis: i64) {
        self.0.fetch_add(delta_millis, Ordering::SeqCst);
    }

    pub fn set(&self, millis: i64) {
        self.0.store(millis, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}
