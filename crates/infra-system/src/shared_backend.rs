// Shared-worker backend
// A fixed set of threads pulling tasks from one lock-free queue until it is empty.
use crossbeam_queue::SegQueue;
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use tracing::{debug, warn};

use forkpool_core::application::execute_task;
use forkpool_core::domain::{ConcurrencyLimit, FailureEntry, RunReport, Task, TaskOutcome};
use forkpool_core::error::{ExecutorError, Result};
use forkpool_core::port::{Backend, BackendKind};

/// Worker thread names are this prefix plus the worker index
pub const WORKER_THREAD_PREFIX: &str = "forkpool-shared-";

/// Shared-worker backend
///
/// The task queue and both output collections are `SegQueue`s, so workers
/// never take a lock and never talk to each other. `run` returns only after
/// every worker has seen the queue empty and exited.
#[derive(Debug, Default)]
pub struct SharedBackend;

impl SharedBackend {
    pub fn new() -> Self {
        Self
    }
}

/// State visible to every worker of one batch
struct SharedState {
    queue: SegQueue<Task>,
    results: SegQueue<Value>,
    failures: SegQueue<FailureEntry>,
    active: AtomicUsize,
    peak: AtomicUsize,
}

impl SharedState {
    fn new(tasks: Vec<Task>) -> Self {
        let queue = SegQueue::new();
        for task in tasks {
            queue.push(task);
        }
        Self {
            queue,
            results: SegQueue::new(),
            failures: SegQueue::new(),
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    /// Worker loop: pop without blocking, exit on an empty queue
    fn work(&self, index: usize) -> usize {
        let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now_active, Ordering::SeqCst);

        let mut processed = 0;
        while let Some(task) = self.queue.pop() {
            match execute_task(&task) {
                TaskOutcome::Success(value) => self.results.push(value),
                TaskOutcome::Failure(entry) => {
                    warn!(
                        worker = index,
                        function = %entry.function_name,
                        message = %entry.message,
                        "Task failed"
                    );
                    self.failures.push(entry);
                }
            }
            processed += 1;
        }

        self.active.fetch_sub(1, Ordering::SeqCst);
        debug!(worker = index, processed, "Queue drained, worker exiting");
        processed
    }

    fn into_report(self, workers_started: usize) -> RunReport {
        RunReport {
            results: std::iter::from_fn(|| self.results.pop()).collect(),
            failures: std::iter::from_fn(|| self.failures.pop()).collect(),
            workers_started,
            peak_active_workers: self.peak.load(Ordering::SeqCst),
        }
    }
}

impl Backend for SharedBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Shared
    }

    fn run(&self, tasks: Vec<Task>, limit: ConcurrencyLimit) -> Result<RunReport> {
        let worker_count = limit.workers_for(tasks.len());
        let state = SharedState::new(tasks);

        let joined: Result<usize> = thread::scope(|scope| {
            let mut handles = Vec::with_capacity(worker_count);
            let mut spawn_error = None;

            for index in 0..worker_count {
                let state = &state;
                let spawned = thread::Builder::new()
                    .name(format!("{}{}", WORKER_THREAD_PREFIX, index))
                    .spawn_scoped(scope, move || state.work(index));
                match spawned {
                    Ok(handle) => handles.push(handle),
                    Err(e) => {
                        spawn_error = Some(ExecutorError::Spawn(format!(
                            "worker thread {}: {}",
                            index, e
                        )));
                        break;
                    }
                }
            }

            // Join barrier: already-started workers drain the queue either way
            let mut processed = 0;
            for handle in handles {
                processed += handle.join().map_err(|_| {
                    ExecutorError::Internal("shared worker thread panicked".to_string())
                })?;
            }

            match spawn_error {
                Some(e) => Err(e),
                None => Ok(processed),
            }
        });

        let processed = joined?;
        debug!(workers = worker_count, processed, "Shared pool joined");
        Ok(state.into_report(worker_count))
    }
}
