//! Builtin task functions the CLI can run by name

use forkpool_core::domain::{require_i64, require_str, ArgMap, NamedFn, TaskFault};
use forkpool_core::{fault, named_fn};
use serde_json::{json, Value};
use std::time::Duration;

/// Every function a batch file may reference
pub fn registry() -> Vec<(NamedFn, &'static str)> {
    vec![
        (named_fn!(inc), "val + 1 (val: integer)"),
        (named_fn!(square), "val * val (val: integer)"),
        (named_fn!(concat), "a + b (a, b: strings)"),
        (named_fn!(sleep_ms), "sleeps for ms milliseconds, returns ms"),
        (named_fn!(fail), "always raises InvalidValue with message"),
        (named_fn!(panic), "always panics with message"),
    ]
}

/// Look up a builtin by name
pub fn lookup(name: &str) -> Option<NamedFn> {
    registry()
        .into_iter()
        .map(|(function, _)| function)
        .find(|function| function.name() == name)
}

pub fn inc(args: &ArgMap) -> Result<Value, TaskFault> {
    Ok(json!(require_i64(args, "val")? + 1))
}

pub fn square(args: &ArgMap) -> Result<Value, TaskFault> {
    let val = require_i64(args, "val")?;
    match val.checked_mul(val) {
        Some(sq) => Ok(json!(sq)),
        None => Err(fault!(InvalidValue, "{} squared overflows i64", val)),
    }
}

pub fn concat(args: &ArgMap) -> Result<Value, TaskFault> {
    let a = require_str(args, "a")?;
    let b = require_str(args, "b")?;
    Ok(json!(format!("{}{}", a, b)))
}

pub fn sleep_ms(args: &ArgMap) -> Result<Value, TaskFault> {
    let ms = require_i64(args, "ms")?;
    if ms < 0 {
        return Err(fault!(InvalidValue, "ms must be non-negative, got {}", ms));
    }
    std::thread::sleep(Duration::from_millis(ms as u64));
    Ok(json!(ms))
}

pub fn fail(args: &ArgMap) -> Result<Value, TaskFault> {
    let message = args
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("requested failure");
    Err(fault!(InvalidValue, "{}", message))
}

pub fn panic(args: &ArgMap) -> Result<Value, TaskFault> {
    let message = args
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or("requested panic");
    panic!("{}", message)
}
