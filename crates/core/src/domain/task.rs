// Task Domain Model

use super::fault::TaskFault;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Keyword arguments of a task
pub type ArgMap = serde_json::Map<String, Value>;

/// A task callable: keyword arguments in, JSON value or fault out
pub type TaskFn = Arc<dyn Fn(&ArgMap) -> Result<Value, TaskFault> + Send + Sync>;

/// A callable paired with its declared name
#[derive(Clone)]
pub struct NamedFn {
    name: String,
    callable: TaskFn,
}

impl NamedFn {
    pub fn new<F>(name: impl Into<String>, callable: F) -> Self
    where
        F: Fn(&ArgMap) -> Result<Value, TaskFault> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            callable: Arc::new(callable),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn callable(&self) -> &TaskFn {
        &self.callable
    }
}

impl fmt::Debug for NamedFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamedFn").field("name", &self.name).finish()
    }
}

/// Wrap a function item together with its own name.
///
/// `named_fn!(inc)` is `NamedFn::new("inc", inc)`.
#[macro_export]
macro_rules! named_fn {
    ($func:ident) => {
        $crate::domain::NamedFn::new(stringify!($func), $func)
    };
}

/// The unit of work: a named callable plus the keyword arguments to call it with.
///
/// Fields are private; a task cannot change once built.
#[derive(Clone)]
pub struct Task {
    function: NamedFn,
    args: ArgMap,
}

impl Task {
    pub fn new(function: NamedFn, args: ArgMap) -> Self {
        Self { function, args }
    }

    pub fn from_fn<F>(name: impl Into<String>, callable: F, args: ArgMap) -> Self
    where
        F: Fn(&ArgMap) -> Result<Value, TaskFault> + Send + Sync + 'static,
    {
        Self::new(NamedFn::new(name, callable), args)
    }

    /// Declared name of the callable
    pub fn name(&self) -> &str {
        self.function.name()
    }

    pub fn args(&self) -> &ArgMap {
        &self.args
    }

    /// Invoke the callable (faults are returned, panics propagate)
    pub fn call(&self) -> Result<Value, TaskFault> {
        (self.function.callable())(&self.args)
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("name", &self.function.name)
            .field("args", &self.args)
            .finish()
    }
}

// Argument accessors for task bodies. Faults point at the task's call site.

/// Fetch a required keyword argument
#[track_caller]
pub fn require_arg<'a>(args: &'a ArgMap, key: &str) -> Result<&'a Value, TaskFault> {
    match args.get(key) {
        Some(value) => Ok(value),
        None => Err(TaskFault::missing_argument(key)),
    }
}

/// Fetch a required integer keyword argument
#[track_caller]
pub fn require_i64(args: &ArgMap, key: &str) -> Result<i64, TaskFault> {
    let value = require_arg(args, key)?;
    match value.as_i64() {
        Some(n) => Ok(n),
        None => Err(TaskFault::type_mismatch(format!(
            "argument '{}' must be an integer, got {}",
            key,
            json_type_name(value)
        ))),
    }
}

/// Fetch a required string keyword argument
#[track_caller]
pub fn require_str<'a>(args: &'a ArgMap, key: &str) -> Result<&'a str, TaskFault> {
    let value = require_arg(args, key)?;
    match value.as_str() {
        Some(s) => Ok(s),
        None => Err(TaskFault::type_mismatch(format!(
            "argument '{}' must be a string, got {}",
            key,
            json_type_name(value)
        ))),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FaultKind;
    use serde_json::json;

    fn args(value: Value) -> ArgMap {
        value.as_object().cloned().unwrap()
    }

    fn inc(args: &ArgMap) -> Result<Value, TaskFault> {
        Ok(json!(require_i64(args, "val")? + 1))
    }

    #[test]
    fn test_task_call_passes_args() {
        let task = Task::new(crate::named_fn!(inc), args(json!({"val": 41})));
        assert_eq!(task.name(), "inc");
        assert_eq!(task.call().unwrap(), json!(42));
    }

    #[test]
    fn test_require_i64_type_mismatch() {
        let task = Task::new(crate::named_fn!(inc), args(json!({"val": "a"})));
        let fault = task.call().unwrap_err();
        assert_eq!(fault.kind, FaultKind::TypeMismatch);
        assert!(fault.detail.contains("got string"));
        assert!(fault.location.file.ends_with("task.rs"));
    }

    #[test]
    fn test_require_arg_missing() {
        let task = Task::from_fn("inc", inc, ArgMap::new());
        let fault = task.call().unwrap_err();
        assert_eq!(fault.kind, FaultKind::MissingArgument);
        assert!(fault.detail.contains("'val'"));
    }

    #[test]
    fn test_require_str() {
        let map = args(json!({"s": "x", "n": 1}));
        assert_eq!(require_str(&map, "s").unwrap(), "x");
        assert_eq!(
            require_str(&map, "n").unwrap_err().kind,
            FaultKind::TypeMismatch
        );
    }

    #[test]
    fn test_debug_omits_callable() {
        let task = Task::from_fn("noop", |_| Ok(Value::Null), ArgMap::new());
        let rendered = format!("{:?}", task);
        assert!(rendered.contains("noop"));
    }
}
