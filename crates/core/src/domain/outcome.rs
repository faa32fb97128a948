// Outcome Domain Model

use super::task::ArgMap;
use crate::port::BackendKind;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Structured record of a task that raised a fault
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureEntry {
    /// Diagnostic line: `File "<file>", line <n>, in <fn> [<Kind>]: <detail>`
    pub message: String,
    /// Declared name of the callable
    pub function_name: String,
    /// Exact arguments the callable was invoked with
    pub args: ArgMap,
}

/// Outcome of a single task execution
#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutcome {
    Success(Value),
    Failure(FailureEntry),
}

/// What a backend hands back after draining its pool
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    pub results: Vec<Value>,
    pub failures: Vec<FailureEntry>,
    pub workers_started: usize,
    pub peak_active_workers: usize,
}

impl RunReport {
    /// Route an outcome into the matching collection
    pub fn record(&mut self, outcome: TaskOutcome) {
        match outcome {
            TaskOutcome::Success(value) => self.results.push(value),
            TaskOutcome::Failure(entry) => self.failures.push(entry),
        }
    }

    pub fn total(&self) -> usize {
        self.results.len() + self.failures.len()
    }
}

/// Pool instrumentation for one batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStats {
    pub workers_started: usize,
    /// Highest active worker count seen at any admission step
    pub peak_active_workers: usize,
    pub duration_ms: i64,
}

/// Results and failures of one executor batch
///
/// Result order is completion order, not submission order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub batch_id: String,
    pub backend: BackendKind,
    pub results: Vec<Value>,
    pub failures: Vec<FailureEntry>,
    pub stats: PoolStats,
}

impl BatchOutcome {
    /// Outcome of a batch with no tasks (no workers started)
    pub fn empty(batch_id: impl Into<String>, backend: BackendKind) -> Self {
        Self {
            batch_id: batch_id.into(),
            backend,
            results: Vec::new(),
            failures: Vec::new(),
            stats: PoolStats::default(),
        }
    }

    pub fn from_report(
        batch_id: impl Into<String>,
        backend: BackendKind,
        report: RunReport,
        duration_ms: i64,
    ) -> Self {
        Self {
            batch_id: batch_id.into(),
            backend,
            results: report.results,
            failures: report.failures,
            stats: PoolStats {
                workers_started: report.workers_started,
                peak_active_workers: report.peak_active_workers,
                duration_ms,
            },
        }
    }

    pub fn total(&self) -> usize {
        self.results.len() + self.failures.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_routes_by_outcome() {
        let mut report = RunReport::default();
        report.record(TaskOutcome::Success(json!(1)));
        report.record(TaskOutcome::Failure(FailureEntry {
            message: "boom".to_string(),
            function_name: "f".to_string(),
            args: ArgMap::new(),
        }));
        report.record(TaskOutcome::Success(json!(2)));

        assert_eq!(report.results, vec![json!(1), json!(2)]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.total(), 3);
    }

    #[test]
    fn test_failure_entry_serializes_all_fields() {
        let mut args = ArgMap::new();
        args.insert("val".to_string(), json!("a"));
        let entry = FailureEntry {
            message: "m".to_string(),
            function_name: "inc".to_string(),
            args,
        };

        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(
            value,
            json!({"message": "m", "function_name": "inc", "args": {"val": "a"}})
        );
    }

    #[test]
    fn test_from_report_carries_stats() {
        let report = RunReport {
            results: vec![json!(true)],
            failures: vec![],
            workers_started: 1,
            peak_active_workers: 1,
        };
        let outcome = BatchOutcome::from_report("b-1", BackendKind::Shared, report, 12);

        assert_eq!(outcome.batch_id, "b-1");
        assert_eq!(outcome.total(), 1);
        assert!(outcome.is_clean());
        assert_eq!(outcome.stats.duration_ms, 12);
        assert_eq!(outcome.stats.peak_active_workers, 1);
    }
}
