// Application Layer - Diagnostics, guarded execution and the executor facade

pub mod diagnostic;
pub mod executor;
pub mod worker;

// Re-exports
pub use diagnostic::format_diagnostic;
pub use executor::{Executor, ExecutorBuilder};
pub use worker::{execute_task, failure_entry};
