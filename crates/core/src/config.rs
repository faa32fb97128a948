// Executor Configuration
//
// Defaults come from worker constants; every value can be overridden through
// FORKPOOL_* environment variables.

use crate::application::worker::constants::{
    DEFAULT_CONCURRENCY, DEFAULT_MAX_CONCURRENCY, DEFAULT_POLL_INTERVAL,
};
use crate::error::{ExecutorError, Result};
use std::time::Duration;

pub const ENV_POLL_INTERVAL_MS: &str = "FORKPOOL_POLL_INTERVAL_MS";
pub const ENV_MAX_CONCURRENCY: &str = "FORKPOOL_MAX_CONCURRENCY";
pub const ENV_CONCURRENCY: &str = "FORKPOOL_CONCURRENCY";

/// Executor settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutorConfig {
    /// Pause between reap passes of the isolated backend when nothing finished
    pub poll_interval: Duration,
    /// Requests above this concurrency are rejected
    pub max_concurrency: usize,
    /// Concurrency used by callers that don't choose one (CLI)
    pub default_concurrency: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            default_concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

impl ExecutorConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup (tests inject a map)
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_POLL_INTERVAL_MS) {
            config.poll_interval = Duration::from_millis(parse_number(ENV_POLL_INTERVAL_MS, &raw)?);
        }
        if let Some(raw) = lookup(ENV_MAX_CONCURRENCY) {
            config.max_concurrency = parse_number(ENV_MAX_CONCURRENCY, &raw)? as usize;
        }
        if let Some(raw) = lookup(ENV_CONCURRENCY) {
            config.default_concurrency = parse_number(ENV_CONCURRENCY, &raw)? as usize;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    /// Check internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrency == 0 {
            return Err(ExecutorError::Config(format!(
                "{} must be at least 1",
                ENV_MAX_CONCURRENCY
            )));
        }
        if self.default_concurrency == 0 || self.default_concurrency > self.max_concurrency {
            return Err(ExecutorError::Config(format!(
                "{} must be between 1 and {}, got {}",
                ENV_CONCURRENCY, self.max_concurrency, self.default_concurrency
            )));
        }
        Ok(())
    }
}

fn parse_number(key: &str, raw: &str) -> Result<u64> {
    raw.trim()
        .parse::<u64>()
        .map_err(|e| ExecutorError::Config(format!("{}='{}': {}", key, raw, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_env_empty() {
        let config = ExecutorConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ExecutorConfig::default());
    }

    #[test]
    fn test_overrides_from_env() {
        let config = ExecutorConfig::from_lookup(lookup(&[
            (ENV_POLL_INTERVAL_MS, "5"),
            (ENV_MAX_CONCURRENCY, "16"),
            (ENV_CONCURRENCY, "8"),
        ]))
        .unwrap();

        assert_eq!(config.poll_interval, Duration::from_millis(5));
        assert_eq!(config.max_concurrency, 16);
        assert_eq!(config.default_concurrency, 8);
    }

    #[test]
    fn test_rejects_garbage() {
        let err = ExecutorConfig::from_lookup(lookup(&[(ENV_POLL_INTERVAL_MS, "soon")]))
            .unwrap_err();
        assert!(matches!(err, ExecutorError::Config(_)));
        assert!(err.to_string().contains(ENV_POLL_INTERVAL_MS));
    }

    #[test]
    fn test_rejects_default_above_max() {
        let err = ExecutorConfig::from_lookup(lookup(&[
            (ENV_MAX_CONCURRENCY, "2"),
            (ENV_CONCURRENCY, "3"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ExecutorError::Config(_)));
    }
}
