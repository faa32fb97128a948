// Forkpool Infrastructure - Execution Backends
// Implements: Backend (isolated processes, shared threads), Outcome Channel codec

#[cfg(unix)]
pub mod isolated_backend;
pub mod outcome_channel;
pub mod shared_backend;

#[cfg(unix)]
pub use isolated_backend::IsolatedBackend;
pub use outcome_channel::{CodecError, WireOutcome};
pub use shared_backend::SharedBackend;

use forkpool_core::{Executor, ExecutorConfig};
use std::sync::Arc;

/// Build an executor with every backend available on this platform
///
/// The isolated backend needs `fork`, so it is only registered on unix.
pub fn default_executor(config: ExecutorConfig) -> Executor {
    let builder = Executor::builder().backend(Arc::new(SharedBackend::new()));

    #[cfg(unix)]
    let builder = builder.backend(Arc::new(IsolatedBackend::new(&config)));

    builder.config(config).build()
}
