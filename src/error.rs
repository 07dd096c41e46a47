//! Error types for the treelens state container.

use crate::tree::Path;
use thiserror::Error;

/// Store-related errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Missing schema in store options")]
    MissingSchema,

    #[error("Store has no dispatcher assigned")]
    NoDispatcher,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Structural violation: {0}")]
    StructuralViolation(String),

    #[error("Path \"{0}\" not found in state.")]
    PathNotFound(Path),

    #[error("Can't assign state: {0}")]
    InvalidState(String),

    #[error("Pending argument rejected: {0}")]
    Rejected(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<config::ConfigError> for StoreError {
    fn from(err: config::ConfigError) -> Self {
        StoreError::ConfigError(err.to_string())
    }
}
