//! Mutual Dependency
//!
//! This example shows several properties reading each other's updated
//! values within one transition.
//!
//! Key concepts:
//! - `summary` reads three siblings, two of which read `input`
//! - Each field's rule runs once no matter how many readers it has
//! - Pure transitions with `Record::next`, no store needed
//!
//! Run with: cargo run --example mutual_dependency

use fieldflow::{
    field, Field, Property, Record, Schema, SchemaError, TransitionContext, TransitionError,
};

#[derive(Debug, Clone, Copy)]
enum CalculationEvent {
    SetValue(i64),
    Calculate,
}

#[derive(Debug, Clone, PartialEq)]
struct Input(i64);

#[derive(Debug, Clone, PartialEq)]
struct Doubled(i64);

#[derive(Debug, Clone, PartialEq)]
struct Tripled(i64);

#[derive(Debug, Clone, PartialEq)]
struct Summary(String);

#[derive(Debug, Clone, PartialEq)]
struct Calculation {
    summary: Summary,
    doubled: Doubled,
    tripled: Tripled,
    input: Input,
}

impl Calculation {
    const SUMMARY: Field<Self, Summary> = field!(Calculation, summary);
    const DOUBLED: Field<Self, Doubled> = field!(Calculation, doubled);
    const TRIPLED: Field<Self, Tripled> = field!(Calculation, tripled);
    const INPUT: Field<Self, Input> = field!(Calculation, input);
}

impl Property<Calculation> for Input {
    type Value = i64;

    fn value(&self) -> &i64 {
        &self.0
    }

    fn initial() -> Self {
        Input(0)
    }

    fn spec(
        &self,
        _ctx: &mut TransitionContext<'_, Calculation>,
        event: &CalculationEvent,
    ) -> Result<Self, TransitionError> {
        Ok(match event {
            CalculationEvent::SetValue(value) => Input(*value),
            CalculationEvent::Calculate => self.clone(),
        })
    }
}

impl Property<Calculation> for Doubled {
    type Value = i64;

    fn value(&self) -> &i64 {
        &self.0
    }

    fn initial() -> Self {
        Doubled(0)
    }

    fn spec(
        &self,
        ctx: &mut TransitionContext<'_, Calculation>,
        event: &CalculationEvent,
    ) -> Result<Self, TransitionError> {
        match event {
            CalculationEvent::Calculate => Ok(Doubled(ctx.compute(Calculation::INPUT)? * 2)),
            _ => Ok(self.clone()),
        }
    }
}

impl Property<Calculation> for Tripled {
    type Value = i64;

    fn value(&self) -> &i64 {
        &self.0
    }

    fn initial() -> Self {
        Tripled(0)
    }

    fn spec(
        &self,
        ctx: &mut TransitionContext<'_, Calculation>,
        event: &CalculationEvent,
    ) -> Result<Self, TransitionError> {
        match event {
            CalculationEvent::Calculate => Ok(Tripled(ctx.compute(Calculation::INPUT)? * 3)),
            _ => Ok(self.clone()),
        }
    }
}

impl Property<Calculation> for Summary {
    type Value = String;

    fn value(&self) -> &String {
        &self.0
    }

    fn initial() -> Self {
        Summary("No calculation yet".to_string())
    }

    fn spec(
        &self,
        ctx: &mut TransitionContext<'_, Calculation>,
        event: &CalculationEvent,
    ) -> Result<Self, TransitionError> {
        match event {
            CalculationEvent::Calculate => {
                let input = ctx.compute(Calculation::INPUT)?;
                let doubled = ctx.compute(Calculation::DOUBLED)?;
                let tripled = ctx.compute(Calculation::TRIPLED)?;
                Ok(Summary(format!(
                    "Input: {input}, Doubled: {doubled}, Tripled: {tripled}, Sum: {}",
                    input + doubled + tripled
                )))
            }
            _ => Ok(self.clone()),
        }
    }
}

impl Record for Calculation {
    type Event = CalculationEvent;

    fn schema() -> Result<Schema<Self>, SchemaError> {
        Schema::builder()
            .property(Self::SUMMARY)
            .property(Self::DOUBLED)
            .property(Self::TRIPLED)
            .property(Self::INPUT)
            .build(|values| {
                Ok(Calculation {
                    summary: values.take(Self::SUMMARY)?,
                    doubled: values.take(Self::DOUBLED)?,
                    tripled: values.take(Self::TRIPLED)?,
                    input: values.take(Self::INPUT)?,
                })
            })
    }
}

fn print_record(label: &str, record: &Calculation) {
    println!("{label}:");
    println!("  Input:   {}", record.input.0);
    println!("  Doubled: {}", record.doubled.0);
    println!("  Tripled: {}", record.tripled.0);
    println!("  Summary: {}", record.summary.0);
    println!();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Mutual Dependency ===\n");

    let initial = Calculation::initial()?;
    print_record("Initial record", &initial);

    let after_set = initial.next(&CalculationEvent::SetValue(5))?;
    print_record("After SetValue(5)", &after_set);

    // Summary is declared first, yet it sees the derived values.
    let after_calculate = after_set.next(&CalculationEvent::Calculate)?;
    print_record("After Calculate", &after_calculate);

    Ok(())
}
