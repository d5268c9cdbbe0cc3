//! Records and their statically registered schemas.
//!
//! A [`Record`] is an immutable snapshot made of named fields. Each record
//! type registers a [`Schema`] once: the ordered list of its fields and a
//! constructor that assembles a new instance from a complete set of values.
//! Nothing about a record is discovered at runtime beyond what the schema
//! declares.

use super::context::TransitionContext;
use super::error::{SchemaError, TransitionError};
use super::property::{Field, Property};
use super::rebuild::rebuild;
use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;

/// An immutable aggregate of named fields.
///
/// Implementors register their schema in [`Record::schema`]; the rest of
/// the protocol is provided.
pub trait Record: Sized + Send + Sync + 'static {
    /// Events this record reacts to.
    type Event: Send + Sync + 'static;

    /// Register the ordered field list and constructor of this record.
    fn schema() -> Result<Schema<Self>, SchemaError>;

    /// A record built from every property's `initial()` and every
    /// pass-through field's `Default`.
    fn initial() -> Result<Self, SchemaError> {
        Self::schema()?.initial()
    }

    /// Apply one event, producing the next record.
    ///
    /// Registers the schema on every call; long-lived callers should hold a
    /// [`Schema`] and call [`rebuild`] directly.
    fn next(&self, event: &Self::Event) -> Result<Self, TransitionError> {
        let schema = Self::schema()?;
        rebuild(&schema, self, event)
    }
}

/// How a field takes part in a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Recomputed through its own `spec` on every transition.
    Property,
    /// Carried over unchanged from the previous record.
    Passthrough,
}

/// A declared field together with its update capability.
pub(crate) trait Slot<R: Record>: Send + Sync {
    fn name(&self) -> &'static str;

    fn kind(&self) -> FieldKind;

    fn value_type(&self) -> (TypeId, &'static str);

    fn resolve(&self, ctx: &mut TransitionContext<'_, R>) -> Result<(), TransitionError>;

    fn seed_initial(&self, values: &mut FieldValues<R>);
}

struct PropertySlot<R, P>(Field<R, P>);

impl<R: Record, P: Property<R>> Slot<R> for PropertySlot<R, P> {
    fn name(&self) -> &'static str {
        self.0.name()
    }

    fn kind(&self) -> FieldKind {
        FieldKind::Property
    }

    fn value_type(&self) -> (TypeId, &'static str) {
        (TypeId::of::<P>(), type_name::<P>())
    }

    fn resolve(&self, ctx: &mut TransitionContext<'_, R>) -> Result<(), TransitionError> {
        ctx.resolve(self.0)
    }

    fn seed_initial(&self, values: &mut FieldValues<R>) {
        values.insert(self.0.name(), P::initial());
    }
}

struct PassthroughSlot<R, T>(Field<R, T>);

impl<R, T> Slot<R> for PassthroughSlot<R, T>
where
    R: Record,
    T: Clone + Default + Send + 'static,
{
    fn name(&self) -> &'static str {
        self.0.name()
    }

    fn kind(&self) -> FieldKind {
        FieldKind::Passthrough
    }

    fn value_type(&self) -> (TypeId, &'static str) {
        (TypeId::of::<T>(), type_name::<T>())
    }

    fn resolve(&self, ctx: &mut TransitionContext<'_, R>) -> Result<(), TransitionError> {
        ctx.carry(self.0);
        Ok(())
    }

    fn seed_initial(&self, values: &mut FieldValues<R>) {
        values.insert(self.0.name(), T::default());
    }
}

type Constructor<R> = Box<dyn Fn(&mut FieldValues<R>) -> Result<R, SchemaError> + Send + Sync>;

/// Ordered field list and constructor of a record type.
///
/// # Example
///
/// ```rust
/// use fieldflow::core::{Field, Property, Record, Schema, SchemaError, TransitionContext, TransitionError};
/// use fieldflow::field;
///
/// #[derive(Clone, Debug, PartialEq)]
/// struct Level(u8);
///
/// impl Property<Gauge> for Level {
///     type Value = u8;
///     fn value(&self) -> &u8 { &self.0 }
///     fn initial() -> Self { Level(0) }
///     fn spec(&self, _: &mut TransitionContext<'_, Gauge>, event: &u8) -> Result<Self, TransitionError> {
///         Ok(Level(*event))
///     }
/// }
///
/// #[derive(Clone, Debug, PartialEq)]
/// struct Gauge {
///     level: Level,
///     label: String,
/// }
///
/// impl Gauge {
///     const LEVEL: Field<Self, Level> = field!(Gauge, level);
///     const LABEL: Field<Self, String> = field!(Gauge, label);
/// }
///
/// impl Record for Gauge {
///     type Event = u8;
///
///     fn schema() -> Result<Schema<Self>, SchemaError> {
///         Schema::builder()
///             .property(Self::LEVEL)
///             .passthrough(Self::LABEL)
///             .build(|values| {
///                 Ok(Gauge {
///                     level: values.take(Self::LEVEL)?,
///                     label: values.take(Self::LABEL)?,
///                 })
///             })
///     }
/// }
///
/// let gauge = Gauge { level: Level(1), label: "tank".to_string() };
/// let next = gauge.next(&9).unwrap();
/// assert_eq!(next, Gauge { level: Level(9), label: "tank".to_string() });
/// ```
pub struct Schema<R: Record> {
    record: &'static str,
    slots: Vec<Box<dyn Slot<R>>>,
    index: HashMap<&'static str, usize>,
    construct: Constructor<R>,
}

impl<R: Record> Schema<R> {
    /// Start registering a schema.
    pub fn builder() -> SchemaBuilder<R> {
        SchemaBuilder::new()
    }

    /// Name of the record type this schema describes.
    pub fn record_name(&self) -> &'static str {
        self.record
    }

    /// Number of declared fields.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether the record declares no fields at all.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Declared fields in registration order.
    pub fn fields(&self) -> impl Iterator<Item = (&'static str, FieldKind)> + '_ {
        self.slots.iter().map(|slot| (slot.name(), slot.kind()))
    }

    /// Whether a field with this name is declared.
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// A record made of every field's default.
    pub fn initial(&self) -> Result<R, SchemaError> {
        let mut values = FieldValues::new();
        for slot in &self.slots {
            slot.seed_initial(&mut values);
        }
        self.construct(&mut values)
    }

    pub(crate) fn slots(&self) -> &[Box<dyn Slot<R>>] {
        &self.slots
    }

    pub(crate) fn construct(&self, values: &mut FieldValues<R>) -> Result<R, SchemaError> {
        (self.construct)(values)
    }

    /// Verify `name` is declared as a property holding a `T`.
    pub(crate) fn check_declared<T: 'static>(&self, name: &'static str) -> Result<(), SchemaError> {
        let slot = self
            .index
            .get(name)
            .map(|&position| &self.slots[position])
            .ok_or(SchemaError::UnknownField {
                record: self.record,
                field: name,
            })?;

        let (declared, declared_name) = slot.value_type();
        if declared != TypeId::of::<T>() {
            return Err(SchemaError::TypeMismatch {
                field: name,
                expected: declared_name,
                found: type_name::<T>(),
            });
        }
        if slot.kind() != FieldKind::Property {
            return Err(SchemaError::NotAProperty {
                record: self.record,
                field: name,
            });
        }
        Ok(())
    }
}

impl<R: Record> fmt::Debug for Schema<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Schema")
            .field("record", &self.record)
            .field("fields", &self.fields().collect::<Vec<_>>())
            .finish()
    }
}

/// Builder for [`Schema`].
///
/// Fields are visited by the rebuild pass in the order they are added.
/// Validation happens in [`SchemaBuilder::build`].
pub struct SchemaBuilder<R: Record> {
    slots: Vec<Box<dyn Slot<R>>>,
}

impl<R: Record> SchemaBuilder<R> {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Declare a field recomputed through its property's `spec`.
    pub fn property<P: Property<R>>(mut self, field: Field<R, P>) -> Self {
        self.slots.push(Box::new(PropertySlot(field)));
        self
    }

    /// Declare a field copied unchanged into every new record.
    pub fn passthrough<T>(mut self, field: Field<R, T>) -> Self
    where
        T: Clone + Default + Send + 'static,
    {
        self.slots.push(Box::new(PassthroughSlot(field)));
        self
    }

    /// Finish registration with the record's constructor.
    ///
    /// Fails if two fields share a name.
    pub fn build<F>(self, construct: F) -> Result<Schema<R>, SchemaError>
    where
        F: Fn(&mut FieldValues<R>) -> Result<R, SchemaError> + Send + Sync + 'static,
    {
        let record = type_name::<R>();
        let mut index = HashMap::with_capacity(self.slots.len());
        for (position, slot) in self.slots.iter().enumerate() {
            if index.insert(slot.name(), position).is_some() {
                return Err(SchemaError::DuplicateField {
                    record,
                    field: slot.name(),
                });
            }
        }

        Ok(Schema {
            record,
            slots: self.slots,
            index,
            construct: Box::new(construct),
        })
    }
}

impl<R: Record> Default for SchemaBuilder<R> {
    fn default() -> Self {
        Self::new()
    }
}

/// Type-erased values keyed by field name.
///
/// Filled by a transition (or by `initial()`) and drained by the record's
/// constructor through typed [`Field`] descriptors.
pub struct FieldValues<R> {
    values: HashMap<&'static str, Stored>,
    _record: PhantomData<fn() -> R>,
}

struct Stored {
    value: Box<dyn Any + Send>,
    type_name: &'static str,
}

impl<R> FieldValues<R> {
    pub(crate) fn new() -> Self {
        Self {
            values: HashMap::new(),
            _record: PhantomData,
        }
    }

    pub(crate) fn insert<T: Send + 'static>(&mut self, name: &'static str, value: T) {
        let stored = Stored {
            value: Box::new(value),
            type_name: type_name::<T>(),
        };
        self.values.insert(name, stored);
    }

    /// Whether a value is present for `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Number of values held.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no value is held.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Borrow the value of `field`.
    pub fn get<T: 'static>(&self, field: Field<R, T>) -> Result<&T, SchemaError> {
        let stored = self
            .values
            .get(field.name())
            .ok_or(SchemaError::MissingValue {
                field: field.name(),
            })?;

        stored
            .value
            .downcast_ref::<T>()
            .ok_or(SchemaError::TypeMismatch {
                field: field.name(),
                expected: type_name::<T>(),
                found: stored.type_name,
            })
    }

    /// Move the value of `field` out.
    pub fn take<T: 'static>(&mut self, field: Field<R, T>) -> Result<T, SchemaError> {
        let stored = self
            .values
            .remove(field.name())
            .ok_or(SchemaError::MissingValue {
                field: field.name(),
            })?;

        let found = stored.type_name;
        stored
            .value
            .downcast::<T>()
            .map(|value| *value)
            .map_err(|_| SchemaError::TypeMismatch {
                field: field.name(),
                expected: type_name::<T>(),
                found,
            })
    }
}

impl<R> fmt::Debug for FieldValues<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.values.keys()).finish()
    }
}
