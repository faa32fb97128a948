// Worker constants (No magic values)
use std::time::Duration;

/// Sleep between reap passes when no isolated worker finished (1ms)
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Concurrency used when the caller does not pick one
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Largest concurrency a caller may request
pub const DEFAULT_MAX_CONCURRENCY: usize = 1024;

/// Panic payload text when the payload is neither `&str` nor `String`
pub const UNKNOWN_PANIC_MESSAGE: &str = "Unknown panic";
