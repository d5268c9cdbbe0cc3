//! Counter
//!
//! This example drives a store through a handful of counter events.
//!
//! Key concepts:
//! - Two properties, one reading the other's updated value
//! - Dispatching from the store and observing through a subscription
//! - Declaration order does not decide evaluation order
//!
//! Run with: cargo run --example counter

use fieldflow::{
    field, Field, Property, Record, Schema, SchemaError, Store, TransitionContext,
    TransitionError,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy)]
enum CounterEvent {
    Increment,
    Decrement,
    SetValue(i64),
}

#[derive(Debug, Clone, PartialEq)]
struct Count(i64);

#[derive(Debug, Clone, PartialEq)]
struct Message(String);

// Message is declared first on purpose; it still sees the new count.
#[derive(Debug, Clone, PartialEq)]
struct Counter {
    message: Message,
    count: Count,
}

impl Counter {
    const MESSAGE: Field<Self, Message> = field!(Counter, message);
    const COUNT: Field<Self, Count> = field!(Counter, count);
}

impl Property<Counter> for Count {
    type Value = i64;

    fn value(&self) -> &i64 {
        &self.0
    }

    fn initial() -> Self {
        Count(0)
    }

    fn spec(
        &self,
        _ctx: &mut TransitionContext<'_, Counter>,
        event: &CounterEvent,
    ) -> Result<Self, TransitionError> {
        Ok(match event {
            CounterEvent::Increment => Count(self.0 + 1),
            CounterEvent::Decrement => Count(self.0 - 1),
            CounterEvent::SetValue(value) => Count(*value),
        })
    }
}

impl Property<Counter> for Message {
    type Value = String;

    fn value(&self) -> &String {
        &self.0
    }

    fn initial() -> Self {
        Message("Ready".to_string())
    }

    fn spec(
        &self,
        ctx: &mut TransitionContext<'_, Counter>,
        event: &CounterEvent,
    ) -> Result<Self, TransitionError> {
        let count = ctx.compute(Counter::COUNT)?;
        Ok(Message(match event {
            CounterEvent::Increment => format!("Incremented to {count}"),
            CounterEvent::Decrement => format!("Decremented to {count}"),
            CounterEvent::SetValue(_) => format!("Set to {count}"),
        }))
    }
}

impl Record for Counter {
    type Event = CounterEvent;

    fn schema() -> Result<Schema<Self>, SchemaError> {
        Schema::builder()
            .property(Self::MESSAGE)
            .property(Self::COUNT)
            .build(|values| {
                Ok(Counter {
                    message: values.take(Self::MESSAGE)?,
                    count: values.take(Self::COUNT)?,
                })
            })
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Counter ===\n");

    let store = Store::new(Counter::initial()?)?;
    let mut subscription = store.subscribe();

    let events = [
        CounterEvent::Increment,
        CounterEvent::Increment,
        CounterEvent::Decrement,
        CounterEvent::SetValue(100),
    ];
    for event in events {
        println!("dispatch {:?}", event);
        store.dispatch(event);
    }
    println!();

    for _ in 0..=events.len() {
        if let Some(record) = subscription.next().await {
            println!("  count = {:>3} | {}", record.count.0, record.message.0);
        }
    }

    store.close().await;
    println!("\nFinal version: {}", store.version());
    Ok(())
}
