// Concurrency Limit

use crate::error::{ExecutorError, Result};
use serde::Serialize;
use std::fmt;
use std::num::NonZeroUsize;

/// Upper bound on simultaneously active workers (always >= 1)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ConcurrencyLimit(NonZeroUsize);

impl ConcurrencyLimit {
    /// Validate a caller-supplied worker count
    ///
    /// # Errors
    /// - `ExecutorError::Validation` if `value` is zero or negative
    pub fn new(value: i64) -> Result<Self> {
        if value <= 0 {
            return Err(ExecutorError::Validation(format!(
                "concurrency must be a positive integer, got {}",
                value
            )));
        }
        let value = usize::try_from(value).map_err(|_| {
            ExecutorError::Validation(format!("concurrency {} does not fit usize", value))
        })?;
        NonZeroUsize::new(value)
            .map(Self)
            .ok_or_else(|| ExecutorError::Validation("concurrency must be non-zero".to_string()))
    }

    pub fn get(&self) -> usize {
        self.0.get()
    }

    /// Number of workers worth starting for `task_count` tasks
    pub fn workers_for(&self, task_count: usize) -> usize {
        self.get().min(task_count)
    }
}

impl From<NonZeroUsize> for ConcurrencyLimit {
    fn from(value: NonZeroUsize) -> Self {
        Self(value)
    }
}

impl fmt::Display for ConcurrencyLimit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_zero_and_negative() {
        for bad in [0, -1, i64::MIN] {
            let err = ConcurrencyLimit::new(bad).unwrap_err();
            assert!(matches!(err, ExecutorError::Validation(_)));
            assert!(err.to_string().contains("positive"));
        }
    }

    #[test]
    fn test_accepts_positive() {
        let limit = ConcurrencyLimit::new(4).unwrap();
        assert_eq!(limit.get(), 4);
        assert_eq!(limit.to_string(), "4");
    }

    #[test]
    fn test_workers_for_clamps_to_task_count() {
        let limit = ConcurrencyLimit::new(8).unwrap();
        assert_eq!(limit.workers_for(3), 3);
        assert_eq!(limit.workers_for(20), 8);
        assert_eq!(limit.workers_for(0), 0);
    }
}
