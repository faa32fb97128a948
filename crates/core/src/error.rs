// Central Error Type for the Executor

use crate::port::BackendKind;
use thiserror::Error;

/// Executor-level error type
///
/// Task faults never show up here: they are captured as `FailureEntry`
/// records. These variants cover caller mistakes and infrastructure trouble.
#[derive(Error, Debug)]
pub enum ExecutorError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Backend not available: {0}")]
    BackendUnavailable(BackendKind),

    #[error("Spawn failed: {0}")]
    Spawn(String),

    #[error("Outcome channel error: {0}")]
    Channel(String),

    #[error("Codec error: {0}")]
    Codec(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using ExecutorError
pub type Result<T> = std::result::Result<T, ExecutorError>;

// Note: codec error conversion is handled in the infra-system crate
// by converting to ExecutorError::Codec(String)
