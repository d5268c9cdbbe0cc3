//! Pure core of the update engine.
//!
//! This module contains everything that runs inside a single transition:
//! - The [`Property`] protocol and typed [`Field`] descriptors
//! - [`Record`]s and their statically registered [`Schema`]s
//! - The per-transition resolver, [`TransitionContext`]
//! - The [`rebuild`] pass that drives it
//!
//! Nothing here blocks, suspends, or touches shared state.

mod context;
mod error;
mod property;
mod rebuild;
mod record;

pub use context::TransitionContext;
pub use error::{SchemaError, TransitionError};
pub use property::{Field, Property};
pub use rebuild::rebuild;
pub use record::{FieldKind, FieldValues, Record, Schema, SchemaBuilder};
