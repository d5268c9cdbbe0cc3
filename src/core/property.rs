//! Properties and the typed field descriptors that locate them.
//!
//! A [`Property`] is a record slot that knows how to derive its own next
//! value from the event being applied. A [`Field`] names a slot and reads it
//! out of a record, so the resolver can demand sibling values by descriptor
//! instead of inspecting the record at runtime.

use super::context::TransitionContext;
use super::error::TransitionError;
use super::record::Record;
use std::fmt;

/// A record slot carrying its own update rule.
///
/// `spec` must be pure: no I/O, no blocking, no shared mutation. It may call
/// [`TransitionContext::compute`] to read the *already updated* value of a
/// sibling field; errors from `compute` should be propagated with `?`.
///
/// # Example
///
/// ```rust
/// use fieldflow::core::{Property, Record, TransitionContext, TransitionError};
/// # use fieldflow::core::{Schema, SchemaError};
/// # use fieldflow::field;
/// #
/// # #[derive(Clone, Debug)]
/// # struct Tally { hits: Hits }
/// # impl Tally { const HITS: fieldflow::core::Field<Self, Hits> = field!(Tally, hits); }
/// # impl Record for Tally {
/// #     type Event = u32;
/// #     fn schema() -> Result<Schema<Self>, SchemaError> {
/// #         Schema::builder()
/// #             .property(Self::HITS)
/// #             .build(|values| Ok(Tally { hits: values.take(Self::HITS)? }))
/// #     }
/// # }
///
/// #[derive(Clone, Debug, PartialEq)]
/// struct Hits(u32);
///
/// impl Property<Tally> for Hits {
///     type Value = u32;
///
///     fn value(&self) -> &u32 {
///         &self.0
///     }
///
///     fn initial() -> Self {
///         Hits(0)
///     }
///
///     fn spec(
///         &self,
///         _ctx: &mut TransitionContext<'_, Tally>,
///         event: &u32,
///     ) -> Result<Self, TransitionError> {
///         Ok(Hits(self.0 + event))
///     }
/// }
///
/// assert_eq!(Hits::initial(), Hits(0));
/// ```
pub trait Property<R: Record>: Sized + Send + 'static {
    /// The plain value siblings observe through `compute`.
    type Value: Clone;

    /// Current value held by this slot.
    fn value(&self) -> &Self::Value;

    /// Default for this slot. Independent of any record or event.
    fn initial() -> Self;

    /// Compute this slot's next state for `event`.
    fn spec(
        &self,
        ctx: &mut TransitionContext<'_, R>,
        event: &R::Event,
    ) -> Result<Self, TransitionError>;
}

/// Typed descriptor of one named field of record `R` holding a `T`.
///
/// Descriptors are plain data and are usually declared as associated
/// constants with the [`field!`](crate::field) macro.
pub struct Field<R, T> {
    name: &'static str,
    get: fn(&R) -> &T,
}

impl<R, T> Field<R, T> {
    /// Create a descriptor from a field name and an accessor.
    pub const fn new(name: &'static str, get: fn(&R) -> &T) -> Self {
        Self { name, get }
    }

    /// The field's name as registered in the schema.
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Read this field out of `record`.
    pub fn get<'r>(&self, record: &'r R) -> &'r T {
        (self.get)(record)
    }
}

impl<R, T> Clone for Field<R, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<R, T> Copy for Field<R, T> {}

impl<R, T> fmt::Debug for Field<R, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("name", &self.name)
            .field("type", &std::any::type_name::<T>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Pair {
        left: i32,
        right: String,
    }

    const LEFT: Field<Pair, i32> = Field::new("left", |pair: &Pair| &pair.left);
    const RIGHT: Field<Pair, String> = crate::field!(Pair, right);

    #[test]
    fn field_reads_through_accessor() {
        let pair = Pair {
            left: 7,
            right: "seven".to_string(),
        };

        assert_eq!(*LEFT.get(&pair), 7);
        assert_eq!(RIGHT.get(&pair), "seven");
    }

    #[test]
    fn field_macro_uses_member_name() {
        assert_eq!(LEFT.name(), "left");
        assert_eq!(RIGHT.name(), "right");
    }

    #[test]
    fn field_is_copy() {
        let copy = LEFT;
        assert_eq!(copy.name(), LEFT.name());
        assert!(format!("{:?}", copy).contains("left"));
    }
}
