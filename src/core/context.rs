//! Per-transition resolver over sibling fields.
//!
//! A [`TransitionContext`] is created for exactly one (record, event) pair.
//! It evaluates fields on demand, memoizes each result, and tracks which
//! fields are still being computed so a field that ends up requiring its own
//! value fails with the exact dependency chain instead of recursing forever.
//! A field whose `spec` failed keeps failing with the same error for the
//! rest of the transition, even if the sibling that demanded it recovered.
//!
//! Evaluation is synchronous and confined to the caller's stack. The memo
//! and the in-progress stack are owned by the context and dropped with it.

use super::error::TransitionError;
use super::property::{Field, Property};
use super::record::{FieldValues, Record, Schema};
use std::collections::HashMap;

/// Lazy, memoized, cycle-checked evaluator for one transition.
pub struct TransitionContext<'a, R: Record> {
    schema: &'a Schema<R>,
    snapshot: &'a R,
    event: &'a R::Event,
    computed: FieldValues<R>,
    failed: HashMap<&'static str, TransitionError>,
    in_progress: Vec<&'static str>,
}

impl<'a, R: Record> TransitionContext<'a, R> {
    pub(crate) fn new(schema: &'a Schema<R>, snapshot: &'a R, event: &'a R::Event) -> Self {
        Self {
            schema,
            snapshot,
            event,
            computed: FieldValues::new(),
            failed: HashMap::new(),
            in_progress: Vec::new(),
        }
    }

    /// The record being transitioned from. Never partially rebuilt.
    pub fn current(&self) -> &'a R {
        self.snapshot
    }

    /// The event being applied.
    pub fn event(&self) -> &'a R::Event {
        self.event
    }

    /// The new value of `field` for this transition.
    ///
    /// Runs the field's `spec` the first time it is demanded and returns the
    /// memoized result afterwards. Fails with
    /// [`TransitionError::CircularDependency`] if `field` is already being
    /// computed further up the call stack, and with a schema mismatch if
    /// `field` is undeclared or declared as a pass-through. A field whose
    /// `spec` failed returns that same error on every later demand.
    pub fn compute<P>(&mut self, field: Field<R, P>) -> Result<P::Value, TransitionError>
    where
        P: Property<R>,
    {
        Ok(self.compute_property(field)?.value().clone())
    }

    /// Like [`compute`](Self::compute) but borrows the whole new property.
    pub fn compute_property<P>(&mut self, field: Field<R, P>) -> Result<&P, TransitionError>
    where
        P: Property<R>,
    {
        self.resolve(field)?;
        Ok(self.computed.get(field)?)
    }

    /// Whether `name` already has its new value in this transition.
    pub fn is_computed(&self, name: &str) -> bool {
        self.computed.contains(name)
    }

    /// Fields currently being computed, outermost first.
    pub fn in_progress(&self) -> &[&'static str] {
        &self.in_progress
    }

    pub(crate) fn resolve<P>(&mut self, field: Field<R, P>) -> Result<(), TransitionError>
    where
        P: Property<R>,
    {
        let name = field.name();
        // Before the memo: a carried pass-through is memoized too.
        self.schema.check_declared::<P>(name)?;

        if self.computed.contains(name) {
            return Ok(());
        }
        if let Some(error) = self.failed.get(name) {
            return Err(error.clone());
        }

        if self.in_progress.contains(&name) {
            let mut chain = self.in_progress.clone();
            chain.push(name);
            return Err(TransitionError::CircularDependency { chain });
        }

        let (snapshot, event) = (self.snapshot, self.event);
        self.in_progress.push(name);
        let outcome = field.get(snapshot).spec(self, event);
        self.in_progress.pop();

        match outcome {
            Ok(value) => {
                self.computed.insert(name, value);
                Ok(())
            }
            Err(error) => {
                self.failed.insert(name, error.clone());
                Err(error)
            }
        }
    }

    /// Copy a pass-through field from the snapshot.
    pub(crate) fn carry<T>(&mut self, field: Field<R, T>)
    where
        T: Clone + Send + 'static,
    {
        if !self.computed.contains(field.name()) {
            let value = field.get(self.snapshot).clone();
            self.computed.insert(field.name(), value);
        }
    }

    pub(crate) fn into_values(self) -> FieldValues<R> {
        self.computed
    }
}
