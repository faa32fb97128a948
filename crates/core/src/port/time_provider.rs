// Clock port: batch durations are measured through this so tests can pin them
use std::sync::atomic::{AtomicI64, Ordering};

pub trait TimeProvider: Send + Sync {
    /// Milliseconds since the unix epoch
    fn now_millis(&self) -> i64;
}

/// Wall clock backed by chrono
pub struct SystemTimeProvider;

impl TimeProvider for SystemTimeProvider {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Deterministic clock: every reading advances by `step` milliseconds
pub struct SteppingTimeProvider {
    next: AtomicI64,
    step: i64,
}

impl SteppingTimeProvider {
    pub fn new(start: i64, step: i64) -> Self {
        Self {
            next: AtomicI64::new(start),
            step,
        }
    }
}

impl TimeProvider for SteppingTimeProvider {
    fn now_millis(&self) -> i64 {
        self.next.fetch_add(self.step, Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stepping_clock_advances_per_reading() {
        let clock = SteppingTimeProvider::new(1_000, 25);
        assert_eq!(clock.now_millis(), 1_000);
        assert_eq!(clock.now_millis(), 1_025);
        assert_eq!(clock.now_millis(), 1_050);
    }
}
