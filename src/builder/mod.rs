//! Builder API for store construction.
//!
//! This module provides the fluent [`StoreBuilder`] and the [`field!`](crate::field)
//! macro for declaring record fields with minimal boilerplate.

pub mod error;
pub mod macros;
pub mod store;

pub use error::BuildError;
pub use store::StoreBuilder;
