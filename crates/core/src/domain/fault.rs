// Task Fault Model
//
// A fault is what a task callable raises instead of returning a value.
// It carries the location it was raised from so the diagnostic can point
// at the task body rather than at the executor.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Runtime class of a task fault
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FaultKind {
    /// An argument had the wrong JSON type
    TypeMismatch,
    /// A required keyword argument was absent
    MissingArgument,
    /// An argument had the right type but an unusable value
    InvalidValue,
    /// The callable panicked
    Panic,
    /// The isolated worker died before reporting an outcome
    WorkerCrashed,
    /// Caller-defined fault class
    Other(String),
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FaultKind::TypeMismatch => write!(f, "TypeMismatch"),
            FaultKind::MissingArgument => write!(f, "MissingArgument"),
            FaultKind::InvalidValue => write!(f, "InvalidValue"),
            FaultKind::Panic => write!(f, "Panic"),
            FaultKind::WorkerCrashed => write!(f, "WorkerCrashed"),
            FaultKind::Other(name) => write!(f, "{}", name),
        }
    }
}

/// Source location a fault was raised from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaultLocation {
    pub file: String,
    pub line: u32,
    /// Enclosing function, when it could be determined at the raise site
    pub function: Option<String>,
}

impl FaultLocation {
    pub fn new(file: impl Into<String>, line: u32, function: Option<&str>) -> Self {
        Self {
            file: file.into(),
            line,
            function: function.map(str::to_string),
        }
    }

    /// Location of the caller (propagates through `#[track_caller]` frames)
    #[track_caller]
    pub fn caller() -> Self {
        let location = std::panic::Location::caller();
        Self::new(location.file(), location.line(), None)
    }

    /// Placeholder used when no frame information exists (e.g. a crashed worker)
    pub fn unknown() -> Self {
        Self::new("<unknown>", 0, None)
    }
}

/// A fault raised by a task callable
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("[{kind}]: {detail}")]
pub struct TaskFault {
    pub kind: FaultKind,
    pub detail: String,
    pub location: FaultLocation,
}

impl TaskFault {
    /// Create a fault located at the caller
    #[track_caller]
    pub fn new(kind: FaultKind, detail: impl Into<String>) -> Self {
        Self::at(kind, detail, FaultLocation::caller())
    }

    /// Create a fault at an explicit location
    pub fn at(kind: FaultKind, detail: impl Into<String>, location: FaultLocation) -> Self {
        Self {
            kind,
            detail: detail.into(),
            location,
        }
    }

    #[track_caller]
    pub fn type_mismatch(detail: impl Into<String>) -> Self {
        Self::new(FaultKind::TypeMismatch, detail)
    }

    #[track_caller]
    pub fn missing_argument(name: &str) -> Self {
        Self::new(
            FaultKind::MissingArgument,
            format!("missing required keyword argument '{}'", name),
        )
    }

    #[track_caller]
    pub fn invalid_value(detail: impl Into<String>) -> Self {
        Self::new(FaultKind::InvalidValue, detail)
    }

    /// Fill in the function name if the raise site could not determine it
    pub fn or_function(mut self, function: &str) -> Self {
        if self.location.function.is_none() {
            self.location.function = Some(function.to_string());
        }
        self
    }
}

/// Raise a located fault from inside a task body.
///
/// Captures `file!()`, `line!()` and the enclosing function name.
///
/// ```
/// use forkpool_core::{fault, TaskFault};
///
/// fn halve(n: i64) -> Result<i64, TaskFault> {
///     if n % 2 != 0 {
///         return Err(fault!(InvalidValue, "{} is odd", n));
///     }
///     Ok(n / 2)
/// }
///
/// let err = halve(3).unwrap_err();
/// assert_eq!(err.location.function.as_deref(), Some("halve"));
/// ```
#[macro_export]
macro_rules! fault {
    ($kind:ident, $($arg:tt)+) => {
        $crate::domain::TaskFault::at(
            $crate::domain::FaultKind::$kind,
            format!($($arg)+),
            $crate::domain::FaultLocation::new(
                file!(),
                line!(),
                Some($crate::__function_name!()),
            ),
        )
    };
}

/// Name of the enclosing function (closures resolve to their parent fn)
#[doc(hidden)]
#[macro_export]
macro_rules! __function_name {
    () => {{
        fn __here() {}
        fn __type_name_of<T>(_: T) -> &'static str {
            ::std::any::type_name::<T>()
        }
        let path = __type_name_of(__here);
        let path = path.strip_suffix("::__here").unwrap_or(path);
        let path = path.trim_end_matches("::{{closure}}");
        match path.rfind("::") {
            Some(idx) => &path[idx + 2..],
            None => path,
        }
    }};
}
