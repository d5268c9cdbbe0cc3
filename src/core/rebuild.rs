//! The rebuild pass: one complete new record per event.

use super::context::TransitionContext;
use super::error::TransitionError;
use super::record::{Record, Schema};

/// Build the record that follows `current` under `event`.
///
/// Every declared field is resolved in schema order, either directly here
/// or earlier as some sibling's dependency; either way each property's
/// `spec` runs exactly once. The new record is only assembled once every
/// field has a value, so any error leaves nothing half-built behind.
pub fn rebuild<R: Record>(
    schema: &Schema<R>,
    current: &R,
    event: &R::Event,
) -> Result<R, TransitionError> {
    let mut ctx = TransitionContext::new(schema, current, event);
    for slot in schema.slots() {
        slot.resolve(&mut ctx)?;
    }

    let mut values = ctx.into_values();
    Ok(schema.construct(&mut values)?)
}
