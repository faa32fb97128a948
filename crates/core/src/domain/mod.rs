// Domain Layer - Tasks, faults and batch outcomes

pub mod fault;
pub mod limit;
pub mod outcome;
pub mod task;

// Re-exports
pub use fault::{FaultKind, FaultLocation, TaskFault};
pub use limit::ConcurrencyLimit;
pub use outcome::{BatchOutcome, FailureEntry, PoolStats, RunReport, TaskOutcome};
pub use task::{require_arg, require_i64, require_str, ArgMap, NamedFn, Task, TaskFn};
