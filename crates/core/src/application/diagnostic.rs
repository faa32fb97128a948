// Diagnostic Formatter

use crate::domain::TaskFault;

/// Function name printed when neither the raise site nor the task supplied one
const UNKNOWN_FUNCTION: &str = "<unknown>";

/// Render a fault as a single diagnostic line
///
/// ```text
/// File "<file>", line <line>, in <function> [<FaultKind>]: <detail>
/// ```
///
/// Pure: the same fault always renders to the same string.
pub fn format_diagnostic(fault: &TaskFault) -> String {
    let location = &fault.location;
    format!(
        "File \"{}\", line {}, in {} [{}]: {}",
        location.file,
        location.line,
        location.function.as_deref().unwrap_or(UNKNOWN_FUNCTION),
        fault.kind,
        fault.detail
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FaultKind, FaultLocation};

    #[test]
    fn test_format_matches_layout() {
        let fault = TaskFault::at(
            FaultKind::TypeMismatch,
            "argument 'val' must be an integer, got string",
            FaultLocation::new("src/tasks.rs", 12, Some("inc")),
        );

        assert_eq!(
            format_diagnostic(&fault),
            "File \"src/tasks.rs\", line 12, in inc [TypeMismatch]: argument 'val' must be an integer, got string"
        );
    }

    #[test]
    fn test_format_is_idempotent() {
        let fault = crate::fault!(InvalidValue, "value {} out of range", 7);
        assert_eq!(format_diagnostic(&fault), format_diagnostic(&fault));
    }

    #[test]
    fn test_format_points_at_raise_site_not_formatter() {
        let fault = crate::fault!(Panic, "x");
        let line = format_diagnostic(&fault);
        assert!(line.contains("in test_format_points_at_raise_site_not_formatter"));
        assert!(!line.contains("format_diagnostic"));
    }

    #[test]
    fn test_unknown_function_placeholder() {
        let fault = TaskFault::at(FaultKind::WorkerCrashed, "gone", FaultLocation::unknown());
        assert_eq!(
            format_diagnostic(&fault),
            "File \"<unknown>\", line 0, in <unknown> [WorkerCrashed]: gone"
        );
    }
}
