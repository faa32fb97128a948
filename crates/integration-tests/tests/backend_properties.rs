//! Properties every backend must satisfy

use forkpool_core::domain::{ArgMap, Task};
use forkpool_core::BackendKind;
use forkpool_integration_tests::{
    backends, executor, inc_fn, kwargs, nap_fn, sorted_ints,
};
use serde_json::{json, Value};

/// Every task yields exactly one outcome
#[test]
fn test_outcome_count_matches_task_count() {
    let executor = executor();

    for backend in backends() {
        let values: Vec<Value> = (0..15)
            .map(|i| if i % 4 == 0 { json!("bad") } else { json!(i) })
            .collect();
        let args: Vec<ArgMap> = values.into_iter().map(|v| kwargs("val", v)).collect();
        let functions = args.iter().map(|_| inc_fn()).collect();

        let outcome = executor.execute(functions, args, 4, backend).unwrap();

        assert_eq!(outcome.total(), 15, "backend {}", backend);
        assert_eq!(outcome.failures.len(), 4, "backend {}", backend);
        assert_eq!(outcome.results.len(), 11, "backend {}", backend);
    }
}

/// Active workers never exceed the configured limit
#[test]
fn test_active_workers_bounded_by_limit() {
    let executor = executor();

    for backend in backends() {
        for limit in [1_i64, 2, 3] {
            let args: Vec<ArgMap> = (0..8).map(|_| kwargs("ms", json!(20))).collect();
            let functions = args.iter().map(|_| nap_fn()).collect();

            let outcome = executor.execute(functions, args, limit, backend).unwrap();

            assert!(
                outcome.stats.peak_active_workers <= limit as usize,
                "backend {} limit {} peak {}",
                backend,
                limit,
                outcome.stats.peak_active_workers
            );
            assert_eq!(outcome.results.len(), 8);
        }
    }
}

/// The isolated backend fills every free slot at admission
#[cfg(unix)]
#[test]
fn test_isolated_admission_fills_to_limit() {
    let args: Vec<ArgMap> = (0..10).map(|_| kwargs("ms", json!(30))).collect();
    let functions = args.iter().map(|_| nap_fn()).collect();

    let outcome = executor()
        .execute(functions, args, 3, BackendKind::Isolated)
        .unwrap();

    assert_eq!(outcome.stats.peak_active_workers, 3);
    assert_eq!(outcome.stats.workers_started, 10);
}

/// The shared backend starts one thread per slot, no more than there are tasks
#[test]
fn test_shared_worker_count() {
    let executor = executor();

    let args: Vec<ArgMap> = (0..10).map(|i| kwargs("val", json!(i))).collect();
    let functions = args.iter().map(|_| inc_fn()).collect();
    let outcome = executor
        .execute(functions, args, 3, BackendKind::Shared)
        .unwrap();
    assert_eq!(outcome.stats.workers_started, 3);

    let outcome = executor
        .execute(vec![inc_fn()], vec![kwargs("val", json!(0))], 6, BackendKind::Shared)
        .unwrap();
    assert_eq!(outcome.stats.workers_started, 1);
}

/// Failure records name the callable and carry its exact arguments
#[test]
fn test_failure_entry_identifies_call() {
    let executor = executor();

    for backend in backends() {
        let mut args = ArgMap::new();
        args.insert("val".to_string(), json!({"nested": [1, 2]}));
        args.insert("extra".to_string(), json!(null));

        let outcome = executor
            .execute(vec![inc_fn()], vec![args.clone()], 1, backend)
            .unwrap();

        assert!(outcome.results.is_empty());
        assert_eq!(outcome.failures.len(), 1);
        let failure = &outcome.failures[0];
        assert_eq!(failure.function_name, "inc", "backend {}", backend);
        assert_eq!(failure.args, args, "backend {}", backend);
        assert!(failure.message.contains("[TypeMismatch]"));
    }
}

/// Successful results equal the callable's return value on every backend
#[test]
fn test_results_independent_of_backend() {
    let executor = executor();

    let runs: Vec<Vec<i64>> = backends()
        .into_iter()
        .map(|backend| {
            let tasks = (0..12)
                .map(|i| Task::new(inc_fn(), kwargs("val", json!(i * 10))))
                .collect();
            let outcome = executor.execute_tasks(tasks, 5, backend).unwrap();
            sorted_ints(&outcome.results)
        })
        .collect();

    let expected: Vec<i64> = (0..12).map(|i| i * 10 + 1).collect();
    for run in runs {
        assert_eq!(run, expected);
    }
}

/// Failure messages have the same shape regardless of the worker type
#[test]
fn test_failure_message_identical_across_backends() {
    let executor = executor();

    let messages: Vec<String> = backends()
        .into_iter()
        .map(|backend| {
            let outcome = executor
                .execute(vec![inc_fn()], vec![kwargs("val", json!("a"))], 1, backend)
                .unwrap();
            outcome.failures[0].message.clone()
        })
        .collect();

    for message in &messages {
        assert_eq!(message, &messages[0]);
    }
}
