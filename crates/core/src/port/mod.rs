// Port Layer - Interfaces for execution backends and injected services

pub mod backend;
pub mod id_provider; // For deterministic batch ids in tests
pub mod time_provider;

// Re-exports
pub use backend::{Backend, BackendKind};
pub use id_provider::IdProvider;
pub use time_provider::TimeProvider;
