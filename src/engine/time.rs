//! Clock abstraction for the streaming tracker.
//!
//! Pitch point timestamps are measured against an injected [`TimeSource`],
//! so tests can drive the tracker with a deterministic clock.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Monotonic clock reporting seconds since an arbitrary origin.
pub trait TimeSource: Send + Sync {
    fn now_secs(&self) -> f64;
}

/// Default time source backed by `Instant::now`.
pub struct SystemTimeSource {
    origin: Instant,
}

impl SystemTimeSource {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for SystemTimeSource {
    fn now_secs(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Deterministic time source for tests and offline replay.
///
/// Each call to `now_secs()` returns the current reading and then advances
/// it by a fixed step (10ms unless configured otherwise), which keeps
/// timestamps strictly increasing without a real clock.
pub struct StubTimeSource {
    now_us: AtomicU64,
    step_us: u64,
}

impl StubTimeSource {
    pub fn new() -> Self {
        Self::with_step(Duration::from_millis(10))
    }

    pub fn with_step(step: Duration) -> Self {
        Self {
            now_us: AtomicU64::new(0),
            step_us: step.as_micros() as u64,
        }
    }

    /// Jump the clock to an absolute reading.
    pub fn set(&self, secs: f64) {
        let us = (secs.max(0.0) * 1_000_000.0) as u64;
        self.now_us.store(us, Ordering::SeqCst);
    }

    pub fn advance(&self, by: Duration) {
        let us = by.as_micros() as u64;
        self.now_us.fetch_add(us, Ordering::SeqCst);
    }
}

impl Default for StubTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for StubTimeSource {
    fn now_secs(&self) -> f64 {
        let us = self.now_us.fetch_add(self.step_us, Ordering::SeqCst);
        us as f64 / 1_000_000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stub_advances_per_read() {
        let clock = StubTimeSource::new();
        assert_eq!(clock.now_secs(), 0.0);
        assert!((clock.now_secs() - 0.01).abs() < 1e-9);
        assert!((clock.now_secs() - 0.02).abs() < 1e-9);
    }

    #[test]
    fn test_stub_set_and_advance() {
        let clock = StubTimeSource::with_step(Duration::ZERO);
        clock.set(2.5);
        assert_eq!(clock.now_secs(), 2.5);
        clock.advance(Duration::from_millis(500));
        assert_eq!(clock.now_secs(), 3.0);
        assert_eq!(clock.now_secs(), 3.0);
    }

    #[test]
    fn test_system_clock_is_monotonic() {
        let clock = SystemTimeSource::new();
        let a = clock.now_secs();
        let b = clock.now_secs();
        assert!(b >= a);
    }
}
