//! Imperative shell around the pure core.
//!
//! This module turns pure rebuild passes into a running pipeline:
//!
//! - **Dispatch**: an ordered inbox fed by any number of producers
//! - **Updater**: a single task applying one event at a time
//! - **Reactions**: async tasks launched after each publish, free to
//!   dispatch further events
//!
//! All I/O and concurrency live here; nothing in here runs inside a
//! transition.

mod dispatch;
mod reaction;
pub(crate) mod updater;

pub(crate) use dispatch::inbox;
pub use dispatch::{DispatchError, Dispatcher, Receipt};
pub use reaction::{reaction_fn, FnReaction, Reaction};
