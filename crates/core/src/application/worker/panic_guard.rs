// Panic isolation for worker safety
//
// A task panic must become a failure record, not kill the worker thread or
// leave the isolated child without a reply. The panic hook is process-wide,
// so it is installed once and only acts for panics raised inside a guard.
use super::constants::UNKNOWN_PANIC_MESSAGE;
use crate::domain::{FaultKind, FaultLocation, TaskFault};
use std::any::Any;
use std::cell::{Cell, RefCell};
use std::panic::{self, catch_unwind, UnwindSafe};
use std::sync::Once;

thread_local! {
    static GUARD_DEPTH: Cell<usize> = const { Cell::new(0) };
    static LAST_PANIC: RefCell<Option<RecordedPanic>> = const { RefCell::new(None) };
}

static INSTALL_HOOK: Once = Once::new();

/// What the hook saw for the most recent guarded panic on this thread
struct RecordedPanic {
    message: Option<String>,
    location: FaultLocation,
}

/// Result of a panic-guarded execution
#[derive(Debug)]
pub enum PanicGuardResult<T> {
    /// Execution completed without panicking
    Success(T),
    /// Execution panicked
    Panicked(CapturedPanic),
}

/// Payload and origin of a caught panic
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedPanic {
    pub message: String,
    pub location: Option<FaultLocation>,
}

impl CapturedPanic {
    /// Convert into a `Panic` fault located at the panic site
    pub fn into_fault(self) -> TaskFault {
        let location = self.location.unwrap_or_else(FaultLocation::unknown);
        TaskFault::at(FaultKind::Panic, self.message, location)
    }
}

/// Execute a closure with panic isolation
///
/// If the closure panics, the panic is caught and returned as
/// `PanicGuardResult::Panicked` together with the file/line it came from.
/// Guarded panics are not printed to stderr; unguarded ones still reach
/// whatever hook was installed before.
///
/// # Example
/// ```text
/// let result = execute_guarded(|| panic!("test panic"));
///
/// match result {
///     PanicGuardResult::Panicked(p) => println!("Caught panic: {}", p.message),
///     _ => {}
/// }
/// ```
pub fn execute_guarded<F, T>(f: F) -> PanicGuardResult<T>
where
    F: FnOnce() -> T + UnwindSafe,
{
    install_hook();

    LAST_PANIC.with(|slot| slot.borrow_mut().take());
    GUARD_DEPTH.with(|depth| depth.set(depth.get() + 1));
    let result = catch_unwind(f);
    GUARD_DEPTH.with(|depth| depth.set(depth.get() - 1));

    match result {
        Ok(value) => PanicGuardResult::Success(value),
        Err(panic_info) => {
            let payload = payload_message(&*panic_info);
            let recorded = LAST_PANIC.with(|slot| slot.borrow_mut().take());

            // resume_unwind skips the hook, so the slot may hold an earlier
            // panic that the task caught itself
            let location = recorded
                .filter(|recorded| recorded.message == payload)
                .map(|recorded| recorded.location);
            let message = payload.unwrap_or_else(|| UNKNOWN_PANIC_MESSAGE.to_string());

            PanicGuardResult::Panicked(CapturedPanic { message, location })
        }
    }
}

fn payload_message(payload: &(dyn Any + Send)) -> Option<String> {
    if let Some(s) = payload.downcast_ref::<&str>() {
        Some(s.to_string())
    } else {
        payload.downcast_ref::<String>().cloned()
    }
}

fn install_hook() {
    INSTALL_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            let guarded = GUARD_DEPTH.with(|depth| depth.get() > 0);
            if !guarded {
                previous(info);
                return;
            }
            let recorded = info.location().map(|loc| RecordedPanic {
                message: payload_message(info.payload()),
                location: FaultLocation::new(loc.file(), loc.line(), None),
            });
            LAST_PANIC.with(|slot| *slot.borrow_mut() = recorded);
        }));
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_passes_value_through() {
        match execute_guarded(|| 7) {
            PanicGuardResult::Success(v) => assert_eq!(v, 7),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_panic_with_str_payload() {
        let line = line!() + 1;
        let result = execute_guarded(|| -> i32 { panic!("static message") });

        match result {
            PanicGuardResult::Panicked(captured) => {
                assert_eq!(captured.message, "static message");
                let location = captured.location.expect("location recorded");
                assert!(location.file.ends_with("panic_guard.rs"));
                assert_eq!(location.line, line);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_panic_with_formatted_payload() {
        let result = execute_guarded(|| -> i32 { panic!("value was {}", 3) });

        match result {
            PanicGuardResult::Panicked(captured) => {
                assert_eq!(captured.message, "value was 3");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_panic_with_opaque_payload() {
        let result = execute_guarded(|| -> i32 { std::panic::panic_any(42u8) });

        match result {
            PanicGuardResult::Panicked(captured) => {
                assert_eq!(captured.message, UNKNOWN_PANIC_MESSAGE);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_resumed_payload_does_not_inherit_caught_panic_location() {
        let result = execute_guarded(|| -> i32 {
            let inner = catch_unwind(|| panic!("inner"));
            assert!(inner.is_err());
            panic::resume_unwind(Box::new("outer"))
        });

        match result {
            PanicGuardResult::Panicked(captured) => {
                assert_eq!(captured.message, "outer");
                assert_eq!(captured.location, None);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_location_not_carried_between_guards() {
        let _ = execute_guarded(|| -> i32 { panic!("first") });

        let result = execute_guarded(|| -> i32 { panic::resume_unwind(Box::new("second")) });

        match result {
            PanicGuardResult::Panicked(captured) => {
                assert_eq!(captured.message, "second");
                assert_eq!(captured.location, None);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_into_fault_is_panic_kind() {
        let fault = CapturedPanic {
            message: "m".to_string(),
            location: None,
        }
        .into_fault();
        assert_eq!(fault.kind, FaultKind::Panic);
        assert_eq!(fault.location, FaultLocation::unknown());
    }
}
