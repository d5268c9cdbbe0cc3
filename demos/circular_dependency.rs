//! Circular Dependency
//!
//! This example wires two fields that read each other and shows how the
//! cycle is reported without disturbing the published record.
//!
//! Key concepts:
//! - `CircularDependency` carries the full chain of field names
//! - A failed transition leaves the store's record untouched
//! - Failure notifications for observers that did not send the event
//!
//! Run with: RUST_LOG=fieldflow=debug cargo run --example circular_dependency

use fieldflow::{
    field, DispatchError, Field, Property, Record, Schema, SchemaError, Store,
    TransitionContext, TransitionError,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy)]
enum CircularEvent {
    TriggerCircular,
    Nudge,
}

#[derive(Debug, Clone, PartialEq)]
struct PropertyA(i64);

#[derive(Debug, Clone, PartialEq)]
struct PropertyB(i64);

#[derive(Debug, Clone, PartialEq)]
struct Circular {
    property_a: PropertyA,
    property_b: PropertyB,
}

impl Circular {
    const PROPERTY_A: Field<Self, PropertyA> = field!(Circular, property_a);
    const PROPERTY_B: Field<Self, PropertyB> = field!(Circular, property_b);
}

impl Property<Circular> for PropertyA {
    type Value = i64;

    fn value(&self) -> &i64 {
        &self.0
    }

    fn initial() -> Self {
        PropertyA(0)
    }

    fn spec(
        &self,
        ctx: &mut TransitionContext<'_, Circular>,
        event: &CircularEvent,
    ) -> Result<Self, TransitionError> {
        match event {
            CircularEvent::TriggerCircular => Ok(PropertyA(ctx.compute(Circular::PROPERTY_B)? + 1)),
            CircularEvent::Nudge => Ok(PropertyA(self.0 + 1)),
        }
    }
}

impl Property<Circular> for PropertyB {
    type Value = i64;

    fn value(&self) -> &i64 {
        &self.0
    }

    fn initial() -> Self {
        PropertyB(0)
    }

    fn spec(
        &self,
        ctx: &mut TransitionContext<'_, Circular>,
        event: &CircularEvent,
    ) -> Result<Self, TransitionError> {
        match event {
            CircularEvent::TriggerCircular => Ok(PropertyB(ctx.compute(Circular::PROPERTY_A)? + 1)),
            CircularEvent::Nudge => Ok(self.clone()),
        }
    }
}

impl Record for Circular {
    type Event = CircularEvent;

    fn schema() -> Result<Schema<Self>, SchemaError> {
        Schema::builder()
            .property(Self::PROPERTY_A)
            .property(Self::PROPERTY_B)
            .build(|values| {
                Ok(Circular {
                    property_a: values.take(Self::PROPERTY_A)?,
                    property_b: values.take(Self::PROPERTY_B)?,
                })
            })
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Circular Dependency ===\n");

    let store = Store::<Circular>::builder().build()?;
    let mut failures = store.failures();

    println!("Attempting to trigger circular dependency...\n");
    match store.send(CircularEvent::TriggerCircular).outcome().await {
        Ok(record) => println!("Unexpected success: {:?}", record),
        Err(DispatchError::Transition(err)) => {
            println!("✓ Circular dependency detected");
            if let Some(chain) = err.chain() {
                println!("  Dependency chain: {}", chain.join(" -> "));
            }
        }
        Err(err) => println!("Store error: {err}"),
    }

    if let Ok(failure) = failures.recv().await {
        println!(
            "  Failure #{} reported at {}",
            failure.sequence,
            failure.at.format("%H:%M:%S%.3f")
        );
    }
    println!("  Record unchanged: {:?}", store.state());
    println!();

    println!("The store keeps processing events:");
    let record = store.send(CircularEvent::Nudge).outcome().await?;
    println!("  After Nudge: {:?}", record);

    store.close().await;
    Ok(())
}
