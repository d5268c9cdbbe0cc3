//! Errors raised while building a store.

use crate::core::SchemaError;
use thiserror::Error;

/// Errors that can occur when building a [`Store`](crate::Store).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("record schema is invalid: {0}")]
    Schema(#[from] SchemaError),

    #[error("{setting} must be greater than zero")]
    InvalidCapacity { setting: &'static str },

    #[error("no tokio runtime available. Build inside a runtime or pass one with .runtime(handle)")]
    NoRuntime,
}
