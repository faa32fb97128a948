//! Shared fixtures for the cross-crate tests

use forkpool_core::domain::{require_i64, ArgMap, NamedFn, TaskFault};
use forkpool_core::{named_fn, BackendKind, Executor, ExecutorConfig};
use serde_json::{json, Value};
use std::time::Duration;

/// `inc(val) = val + 1`
pub fn inc(args: &ArgMap) -> Result<Value, TaskFault> {
    Ok(json!(require_i64(args, "val")? + 1))
}

/// Sleeps `ms` then returns it
pub fn nap(args: &ArgMap) -> Result<Value, TaskFault> {
    let ms = require_i64(args, "ms")?;
    std::thread::sleep(Duration::from_millis(ms as u64));
    Ok(json!(ms))
}

pub fn inc_fn() -> NamedFn {
    named_fn!(inc)
}

pub fn nap_fn() -> NamedFn {
    named_fn!(nap)
}

/// Single-entry argument map
pub fn kwargs(key: &str, value: Value) -> ArgMap {
    let mut map = ArgMap::new();
    map.insert(key.to_string(), value);
    map
}

/// Executor with every backend this platform offers
pub fn executor() -> Executor {
    forkpool_infra_system::default_executor(
        ExecutorConfig::default().with_poll_interval(Duration::from_millis(1)),
    )
}

/// Backends available on this platform
pub fn backends() -> Vec<BackendKind> {
    if cfg!(unix) {
        vec![BackendKind::Isolated, BackendKind::Shared]
    } else {
        vec![BackendKind::Shared]
    }
}

/// Integer results, sorted (completion order is unspecified)
pub fn sorted_ints(results: &[Value]) -> Vec<i64> {
    let mut ints: Vec<i64> = results.iter().filter_map(Value::as_i64).collect();
    ints.sort_unstable();
    ints
}
