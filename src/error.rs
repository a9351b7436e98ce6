//! Error types for the cache facade
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache facade and its stores.
///
/// Invalid keys and values are not errors: writes with invalid input are
/// skipped and report absence instead.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Size query against a key whose container type has no cardinality
    #[error("Type mismatch: {0}")]
    TypeMismatch(String),

    /// Raw command name the store cannot resolve
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// Value could not be encoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Command error reported by an in-process store
    #[error("Store error: {0}")]
    Store(String),

    /// Transport or command error reported by Redis
    #[error(transparent)]
    Redis(#[from] redis::RedisError),
}

impl CacheError {
    /// Error raised when a command hits a key holding another container type.
    pub fn wrong_type() -> Self {
        CacheError::Store(
            "WRONGTYPE Operation against a key holding the wrong kind of value".to_string(),
        )
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache facade.
pub type Result<T> = std::result::Result<T, CacheError>;
