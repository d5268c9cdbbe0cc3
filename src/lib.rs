//! Fieldflow: unidirectional state updates derived field by field
//!
//! A [`Record`] is an immutable snapshot made of named fields. Instead of a
//! hand-written reducer, every [`Property`] field carries its own update
//! rule and may read the *already updated* values of its siblings. The
//! order fields are evaluated in is derived from those reads, never
//! declared.
//!
//! # Core Concepts
//!
//! - **Property**: a field that computes its next value from an event
//! - **Record**: an immutable aggregate registered through a [`Schema`]
//! - **TransitionContext**: the per-transition resolver; lazy, memoized,
//!   and cycle-checked
//! - **Store**: serializes events into one transition at a time, publishes
//!   each new record, then launches [`Reaction`]s
//!
//! # Example
//!
//! ```rust
//! use fieldflow::{field, Field, Property, Record, Schema, SchemaError};
//! use fieldflow::{TransitionContext, TransitionError};
//!
//! enum CounterEvent {
//!     Increment,
//! }
//!
//! #[derive(Clone, Debug, PartialEq)]
//! struct Count(i64);
//!
//! #[derive(Clone, Debug, PartialEq)]
//! struct Message(String);
//!
//! #[derive(Clone, Debug, PartialEq)]
//! struct Counter {
//!     count: Count,
//!     message: Message,
//! }
//!
//! impl Counter {
//!     const COUNT: Field<Self, Count> = field!(Counter, count);
//!     const MESSAGE: Field<Self, Message> = field!(Counter, message);
//! }
//!
//! impl Property<Counter> for Count {
//!     type Value = i64;
//!     fn value(&self) -> &i64 { &self.0 }
//!     fn initial() -> Self { Count(0) }
//!     fn spec(&self, _: &mut TransitionContext<'_, Counter>, _: &CounterEvent) -> Result<Self, TransitionError> {
//!         Ok(Count(self.0 + 1))
//!     }
//! }
//!
//! impl Property<Counter> for Message {
//!     type Value = String;
//!     fn value(&self) -> &String { &self.0 }
//!     fn initial() -> Self { Message("Ready".to_string()) }
//!     fn spec(&self, ctx: &mut TransitionContext<'_, Counter>, _: &CounterEvent) -> Result<Self, TransitionError> {
//!         let count = ctx.compute(Counter::COUNT)?;
//!         Ok(Message(format!("Incremented to {count}")))
//!     }
//! }
//!
//! impl Record for Counter {
//!     type Event = CounterEvent;
//!
//!     fn schema() -> Result<Schema<Self>, SchemaError> {
//!         Schema::builder()
//!             .property(Self::COUNT)
//!             .property(Self::MESSAGE)
//!             .build(|values| {
//!                 Ok(Counter {
//!                     count: values.take(Self::COUNT)?,
//!                     message: values.take(Self::MESSAGE)?,
//!                 })
//!             })
//!     }
//! }
//!
//! let counter = Counter::initial().unwrap();
//! let next = counter.next(&CounterEvent::Increment).unwrap();
//! assert_eq!(next.message, Message("Incremented to 1".to_string()));
//! ```

pub mod broadcast;
pub mod builder;
pub mod config;
pub mod core;
pub mod effects;
mod store;

// Re-export commonly used types
pub use broadcast::{StateCell, Subscription};
pub use builder::{BuildError, StoreBuilder};
pub use config::{FailurePolicy, ReactionShutdown, StoreConfig};
pub use core::{
    rebuild, Field, FieldKind, FieldValues, Property, Record, Schema, SchemaError,
    TransitionContext, TransitionError,
};
pub use effects::{reaction_fn, DispatchError, Dispatcher, Reaction, Receipt};
pub use store::{Store, StoreId, TransitionFailure};

pub use async_trait::async_trait;
