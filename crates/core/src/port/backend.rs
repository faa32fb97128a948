// Backend Port
// Abstraction over the two worker-pool strategies (isolated processes, shared threads)

use crate::domain::{ConcurrencyLimit, RunReport, Task};
use crate::error::{ExecutorError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which worker pool runs a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// One forked process per task, outcome relayed through a pipe
    Isolated,
    /// Fixed set of threads pulling from one shared queue
    Shared,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Isolated => write!(f, "isolated"),
            BackendKind::Shared => write!(f, "shared"),
        }
    }
}

impl FromStr for BackendKind {
    type Err = ExecutorError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "isolated" | "process" => Ok(BackendKind::Isolated),
            "shared" | "thread" => Ok(BackendKind::Shared),
            other => Err(ExecutorError::Validation(format!(
                "unknown backend '{}' (expected 'isolated' or 'shared')",
                other
            ))),
        }
    }
}

/// Backend trait
///
/// Implementations:
/// - IsolatedBackend: forks a process per task (unix)
/// - SharedBackend: scoped threads over a lock-free queue
pub trait Backend: Send + Sync {
    /// Which strategy this backend implements
    fn kind(&self) -> BackendKind;

    /// Run every task with at most `limit` active workers and block until all finish
    ///
    /// Task faults are captured into `RunReport::failures`; they never surface as `Err`.
    ///
    /// # Errors
    /// - ExecutorError::Spawn if a worker cannot be started
    /// - ExecutorError::Channel / Codec if an outcome cannot be transported
    fn run(&self, tasks: Vec<Task>, limit: ConcurrencyLimit) -> Result<RunReport>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::application::worker::execute_task;
    use std::sync::{Arc, Mutex};

    /// One recorded `run` invocation
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct RecordedRun {
        pub task_names: Vec<String>,
        pub limit: usize,
    }

    /// Runs tasks inline, one at a time, and records every call
    pub struct RecordingBackend {
        kind: BackendKind,
        runs: Arc<Mutex<Vec<RecordedRun>>>,
    }

    impl RecordingBackend {
        pub fn new(kind: BackendKind) -> Self {
            Self {
                kind,
                runs: Arc::new(Mutex::new(Vec::new())),
            }
        }

        pub fn runs(&self) -> Vec<RecordedRun> {
            self.runs.lock().unwrap().clone()
        }

        pub fn call_count(&self) -> usize {
            self.runs.lock().unwrap().len()
        }
    }

    impl Backend for RecordingBackend {
        fn kind(&self) -> BackendKind {
            self.kind
        }

        fn run(&self, tasks: Vec<Task>, limit: ConcurrencyLimit) -> Result<RunReport> {
            self.runs.lock().unwrap().push(RecordedRun {
                task_names: tasks.iter().map(|t| t.name().to_string()).collect(),
                limit: limit.get(),
            });

            let mut report = RunReport::default();
            for task in &tasks {
                report.workers_started += 1;
                report.peak_active_workers = 1;
                report.record(execute_task(task));
            }
            Ok(report)
        }
    }

    /// Always fails to start workers
    pub struct FailingBackend {
        kind: BackendKind,
    }

    impl FailingBackend {
        pub fn new(kind: BackendKind) -> Self {
            Self { kind }
        }
    }

    impl Backend for FailingBackend {
        fn kind(&self) -> BackendKind {
            self.kind
        }

        fn run(&self, _tasks: Vec<Task>, _limit: ConcurrencyLimit) -> Result<RunReport> {
            Err(ExecutorError::Spawn("mock spawn failure".to_string()))
        }
    }
}
