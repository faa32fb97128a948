// Worker - guarded execution of a single task
//
// Both backends run tasks through `execute_task`, so fault capture is the
// same whether the worker is a forked process or a pool thread.

pub mod constants;
mod panic_guard;

pub use panic_guard::{execute_guarded, CapturedPanic, PanicGuardResult};

use crate::application::diagnostic::format_diagnostic;
use crate::domain::{FailureEntry, Task, TaskFault, TaskOutcome};
use std::panic::AssertUnwindSafe;

/// Run one task, converting faults and panics into a `FailureEntry`
///
/// Never logs: this runs inside forked children where the log subscriber's
/// locks may be held by threads that no longer exist.
pub fn execute_task(task: &Task) -> TaskOutcome {
    match execute_guarded(AssertUnwindSafe(|| task.call())) {
        PanicGuardResult::Success(Ok(value)) => TaskOutcome::Success(value),
        PanicGuardResult::Success(Err(fault)) => TaskOutcome::Failure(failure_entry(task, fault)),
        PanicGuardResult::Panicked(captured) => {
            TaskOutcome::Failure(failure_entry(task, captured.into_fault()))
        }
    }
}

/// Build the failure record for `task` from a caught fault
pub fn failure_entry(task: &Task, fault: TaskFault) -> FailureEntry {
    let fault = fault.or_function(task.name());
    FailureEntry {
        message: format_diagnostic(&fault),
        function_name: task.name().to_string(),
        args: task.args().clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{require_i64, ArgMap};
    use serde_json::{json, Value};

    fn inc(args: &ArgMap) -> Result<Value, TaskFault> {
        Ok(json!(require_i64(args, "val")? + 1))
    }

    fn explode(_args: &ArgMap) -> Result<Value, TaskFault> {
        panic!("exploded");
    }

    fn args(value: Value) -> ArgMap {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_execute_task_success() {
        let task = Task::new(crate::named_fn!(inc), args(json!({"val": 1})));
        assert_eq!(execute_task(&task), TaskOutcome::Success(json!(2)));
    }

    #[test]
    fn test_execute_task_fault_becomes_failure_entry() {
        let task = Task::new(crate::named_fn!(inc), args(json!({"val": "a"})));

        match execute_task(&task) {
            TaskOutcome::Failure(entry) => {
                assert_eq!(entry.function_name, "inc");
                assert_eq!(entry.args, args(json!({"val": "a"})));
                assert!(entry.message.starts_with("File \""));
                assert!(entry.message.contains("in inc [TypeMismatch]"));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_execute_task_panic_becomes_failure_entry() {
        let task = Task::new(crate::named_fn!(explode), ArgMap::new());

        match execute_task(&task) {
            TaskOutcome::Failure(entry) => {
                assert_eq!(entry.function_name, "explode");
                assert!(entry.message.contains("mod.rs"));
                assert!(entry.message.ends_with("in explode [Panic]: exploded"));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_resumed_panic_reports_unknown_location() {
        let task = Task::from_fn(
            "rethrow",
            |_| {
                let _ = std::panic::catch_unwind(|| panic!("inner"));
                std::panic::resume_unwind(Box::new("outer"))
            },
            ArgMap::new(),
        );

        match execute_task(&task) {
            TaskOutcome::Failure(entry) => {
                assert_eq!(
                    entry.message,
                    "File \"<unknown>\", line 0, in rethrow [Panic]: outer"
                );
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_fault_macro_function_wins_over_task_name() {
        fn checked(_args: &ArgMap) -> Result<Value, TaskFault> {
            Err(crate::fault!(InvalidValue, "nope"))
        }
        let task = Task::from_fn("registered_as", checked, ArgMap::new());

        match execute_task(&task) {
            TaskOutcome::Failure(entry) => {
                assert_eq!(entry.function_name, "registered_as");
                assert!(entry.message.contains("in checked [InvalidValue]: nope"));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }
}
