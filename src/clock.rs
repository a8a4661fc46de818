//! The datetime wall-clock source the core consumes but does not own (§1).

use std::time::{SystemTime, UNIX_EPOCH};

/// Supplies `create_datetime` stamps. A trait so tests can substitute a
/// deterministic sequence instead of the real wall clock.
pub trait Clock: Send + Sync {
    fn now(&self) -> i64;
}

/// The real wall clock, reported as signed Unix seconds (§6).
#[derive(Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or(0)
    }
}

/// A fixed reading, for deterministic `create_datetime` stamps in tests.
/// Gated behind `test-util` (mirroring `tokio`'s own feature of the same
/// name) so integration suites under `tests/` can depend on it too.
#[cfg(any(test, feature = "test-util"))]
pub struct FixedClock(pub i64);

#[cfg(any(test, feature = "test-util"))]
impl Clock for FixedClock {
    fn now(&self) -> i64 {
        self.0
    }
}
