// Forkpool Core - Domain Logic, Diagnostics & Ports
// NO process or thread management here (hexagonal split, see infra-system)

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod port;

pub use application::{Executor, ExecutorBuilder};
pub use config::ExecutorConfig;
pub use domain::{
    ArgMap, BatchOutcome, ConcurrencyLimit, FailureEntry, FaultKind, FaultLocation, NamedFn,
    PoolStats, Task, TaskFault, TaskFn, TaskOutcome,
};
pub use error::{ExecutorError, Result};
pub use port::{Backend, BackendKind};
