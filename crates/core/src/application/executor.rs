// Executor Facade - validates a batch and hands it to the selected backend

use crate::config::ExecutorConfig;
use crate::domain::{ArgMap, BatchOutcome, ConcurrencyLimit, NamedFn, Task};
use crate::error::{ExecutorError, Result};
use crate::port::id_provider::UuidProvider;
use crate::port::time_provider::SystemTimeProvider;
use crate::port::{Backend, BackendKind, IdProvider, TimeProvider};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info, info_span};

/// Bounded-concurrency executor
///
/// Holds one backend per `BackendKind`. Each call runs a single batch and
/// returns once every task has produced a result or a failure record.
pub struct Executor {
    backends: HashMap<BackendKind, Arc<dyn Backend>>,
    config: ExecutorConfig,
    id_provider: Arc<dyn IdProvider>,
    time_provider: Arc<dyn TimeProvider>,
}

impl Executor {
    pub fn builder() -> ExecutorBuilder {
        ExecutorBuilder::default()
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Whether a backend of this kind was registered
    pub fn supports(&self, kind: BackendKind) -> bool {
        self.backends.contains_key(&kind)
    }

    /// Run `functions[i](**args[i])` for every i with at most `concurrency` active workers
    ///
    /// # Errors
    /// - ExecutorError::Validation if the lists differ in length or concurrency is out of range
    /// - ExecutorError::BackendUnavailable if `backend` was not registered
    /// - backend infrastructure errors (spawn, channel); task faults are never errors
    pub fn execute(
        &self,
        functions: Vec<NamedFn>,
        args: Vec<ArgMap>,
        concurrency: i64,
        backend: BackendKind,
    ) -> Result<BatchOutcome> {
        if functions.len() != args.len() {
            return Err(ExecutorError::Validation(format!(
                "got {} functions but {} argument maps",
                functions.len(),
                args.len()
            )));
        }

        let tasks = functions
            .into_iter()
            .zip(args)
            .map(|(function, args)| Task::new(function, args))
            .collect();

        self.execute_tasks(tasks, concurrency, backend)
    }

    /// Run prepared tasks on `backend`
    pub fn execute_tasks(
        &self,
        tasks: Vec<Task>,
        concurrency: i64,
        backend: BackendKind,
    ) -> Result<BatchOutcome> {
        let limit = self.validate_concurrency(concurrency)?;
        let runner = self.backend(backend)?;
        let batch_id = self.id_provider.generate_id();

        if tasks.is_empty() {
            info!(batch_id = %batch_id, backend = %backend, "Empty batch, no workers started");
            return Ok(BatchOutcome::empty(batch_id, backend));
        }

        let span = info_span!("batch", batch_id = %batch_id, backend = %backend);
        let _enter = span.enter();

        let task_count = tasks.len();
        let start_time = self.time_provider.now_millis();
        info!(tasks = task_count, limit = %limit, "Starting batch");

        let report = runner.run(tasks, limit)?;

        let duration_ms = self.time_provider.now_millis() - start_time;
        if report.total() != task_count {
            error!(
                expected = task_count,
                collected = report.total(),
                "Backend lost task outcomes"
            );
        }

        info!(
            results = report.results.len(),
            failures = report.failures.len(),
            workers_started = report.workers_started,
            peak_active_workers = report.peak_active_workers,
            duration_ms = %duration_ms,
            "Batch completed"
        );

        Ok(BatchOutcome::from_report(batch_id, backend, report, duration_ms))
    }

    /// Run a batch on tokio's blocking pool so async callers keep their runtime responsive
    pub async fn execute_async(
        self: Arc<Self>,
        tasks: Vec<Task>,
        concurrency: i64,
        backend: BackendKind,
    ) -> Result<BatchOutcome> {
        tokio::task::spawn_blocking(move || self.execute_tasks(tasks, concurrency, backend))
            .await
            .map_err(|e| ExecutorError::Internal(format!("batch join failed: {}", e)))?
    }

    fn validate_concurrency(&self, concurrency: i64) -> Result<ConcurrencyLimit> {
        let limit = ConcurrencyLimit::new(concurrency)?;
        if limit.get() > self.config.max_concurrency {
            return Err(ExecutorError::Validation(format!(
                "concurrency {} exceeds the maximum of {}",
                limit, self.config.max_concurrency
            )));
        }
        Ok(limit)
    }

    fn backend(&self, kind: BackendKind) -> Result<&Arc<dyn Backend>> {
        self.backends
            .get(&kind)
            .ok_or(ExecutorError::BackendUnavailable(kind))
    }
}

/// Builder for `Executor` (dependency injection point)
pub struct ExecutorBuilder {
    backends: HashMap<BackendKind, Arc<dyn Backend>>,
    config: ExecutorConfig,
    id_provider: Arc<dyn IdProvider>,
    time_provider: Arc<dyn TimeProvider>,
}

impl Default for ExecutorBuilder {
    fn default() -> Self {
        Self {
            backends: HashMap::new(),
            config: ExecutorConfig::default(),
            id_provider: Arc::new(UuidProvider),
            time_provider: Arc::new(SystemTimeProvider),
        }
    }
}

impl ExecutorBuilder {
    /// Register a backend under its own kind (replaces an earlier one of the same kind)
    pub fn backend(mut self, backend: Arc<dyn Backend>) -> Self {
        self.backends.insert(backend.kind(), backend);
        self
    }

    pub fn config(mut self, config: ExecutorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn id_provider(mut self, id_provider: Arc<dyn IdProvider>) -> Self {
        self.id_provider = id_provider;
        self
    }

    pub fn time_provider(mut self, time_provider: Arc<dyn TimeProvider>) -> Self {
        self.time_provider = time_provider;
        self
    }

    pub fn build(self) -> Executor {
        Executor {
            backends: self.backends,
            config: self.config,
            id_provider: self.id_provider,
            time_provider: self.time_provider,
        }
    }
}
