//! Property-based tests for the resolver and rebuild pass.
//!
//! These tests use proptest to check that evaluation order never leaks into
//! results and that cycles are always reported with their exact chain.

use fieldflow::core::{
    rebuild, Field, FieldValues, Property, Record, Schema, SchemaError, TransitionContext,
    TransitionError,
};
use fieldflow::field;
use proptest::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const NAMES: [&str; 5] = ["n0", "n1", "n2", "n3", "n4"];

/// Which nodes each node reads during a transition, and how often each
/// node's spec ran.
#[derive(Default)]
struct Wiring {
    deps: [Vec<usize>; 5],
    calls: [AtomicUsize; 5],
}

impl Wiring {
    fn calls(&self) -> Vec<usize> {
        self.calls
            .iter()
            .map(|calls| calls.load(Ordering::SeqCst))
            .collect()
    }
}

#[derive(Clone, Debug, PartialEq)]
struct Node<const I: usize>(i64);

#[derive(Clone, Debug, PartialEq)]
struct Graph {
    n0: Node<0>,
    n1: Node<1>,
    n2: Node<2>,
    n3: Node<3>,
    n4: Node<4>,
}

impl Graph {
    const N0: Field<Self, Node<0>> = field!(Graph, n0);
    const N1: Field<Self, Node<1>> = field!(Graph, n1);
    const N2: Field<Self, Node<2>> = field!(Graph, n2);
    const N3: Field<Self, Node<3>> = field!(Graph, n3);
    const N4: Field<Self, Node<4>> = field!(Graph, n4);

    fn from_values(values: [i64; 5]) -> Self {
        Graph {
            n0: Node(values[0]),
            n1: Node(values[1]),
            n2: Node(values[2]),
            n3: Node(values[3]),
            n4: Node(values[4]),
        }
    }
}

fn compute_node(
    ctx: &mut TransitionContext<'_, Graph>,
    index: usize,
) -> Result<i64, TransitionError> {
    match index {
        0 => ctx.compute(Graph::N0),
        1 => ctx.compute(Graph::N1),
        2 => ctx.compute(Graph::N2),
        3 => ctx.compute(Graph::N3),
        _ => ctx.compute(Graph::N4),
    }
}

impl<const I: usize> Property<Graph> for Node<I> {
    type Value = i64;

    fn value(&self) -> &i64 {
        &self.0
    }

    fn initial() -> Self {
        Node(0)
    }

    fn spec(
        &self,
        ctx: &mut TransitionContext<'_, Graph>,
        wiring: &Arc<Wiring>,
    ) -> Result<Self, TransitionError> {
        wiring.calls[I].fetch_add(1, Ordering::SeqCst);
        let mut total = self.0 + I as i64 + 1;
        for &dep in &wiring.deps[I] {
            total += 2 * compute_node(ctx, dep)?;
        }
        Ok(Node(total))
    }
}

fn assemble(values: &mut FieldValues<Graph>) -> Result<Graph, SchemaError> {
    Ok(Graph {
        n0: values.take(Graph::N0)?,
        n1: values.take(Graph::N1)?,
        n2: values.take(Graph::N2)?,
        n3: values.take(Graph::N3)?,
        n4: values.take(Graph::N4)?,
    })
}

fn schema_in_order(order: &[usize]) -> Schema<Graph> {
    order
        .iter()
        .fold(Schema::builder(), |builder, &index| match index {
            0 => builder.property(Graph::N0),
            1 => builder.property(Graph::N1),
            2 => builder.property(Graph::N2),
            3 => builder.property(Graph::N3),
            _ => builder.property(Graph::N4),
        })
        .build(assemble)
        .expect("graph schema is valid")
}

impl Record for Graph {
    type Event = Arc<Wiring>;

    fn schema() -> Result<Schema<Self>, SchemaError> {
        Schema::builder()
            .property(Self::N0)
            .property(Self::N1)
            .property(Self::N2)
            .property(Self::N3)
            .property(Self::N4)
            .build(assemble)
    }
}

/// Node `i` may only read nodes below it, so the graph is acyclic.
fn acyclic_wiring(edges: &[bool]) -> Arc<Wiring> {
    let mut wiring = Wiring::default();
    let mut bits = edges.iter();
    for i in 0..5 {
        for j in 0..i {
            if bits.next().copied().unwrap_or(false) {
                wiring.deps[i].push(j);
            }
        }
    }
    Arc::new(wiring)
}

/// Nodes `0..len` each read their successor, closing a ring.
fn ring_wiring(len: usize) -> Arc<Wiring> {
    let mut wiring = Wiring::default();
    for i in 0..len {
        wiring.deps[i].push((i + 1) % len);
    }
    Arc::new(wiring)
}

prop_compose! {
    fn arbitrary_order()(order in Just(vec![0usize, 1, 2, 3, 4]).prop_shuffle()) -> Vec<usize> {
        order
    }
}

proptest! {
    #[test]
    fn acyclic_fields_resolve_exactly_once(
        start in prop::array::uniform5(-100i64..100),
        edges in prop::collection::vec(any::<bool>(), 10),
        order in arbitrary_order(),
    ) {
        let schema = schema_in_order(&order);
        let wiring = acyclic_wiring(&edges);

        let result = rebuild(&schema, &Graph::from_values(start), &wiring);

        prop_assert!(result.is_ok());
        prop_assert_eq!(wiring.calls(), vec![1; 5]);
    }

    #[test]
    fn result_is_independent_of_visitation_order(
        start in prop::array::uniform5(-100i64..100),
        edges in prop::collection::vec(any::<bool>(), 10),
        order in arbitrary_order(),
    ) {
        let current = Graph::from_values(start);

        let declared = rebuild(&Graph::schema().unwrap(), &current, &acyclic_wiring(&edges));
        let shuffled = rebuild(&schema_in_order(&order), &current, &acyclic_wiring(&edges));

        prop_assert_eq!(declared, shuffled);
    }

    #[test]
    fn dependents_observe_updated_values(
        start in prop::array::uniform5(-100i64..100),
        order in arbitrary_order(),
    ) {
        // n4 reads every other node.
        let mut wiring = Wiring::default();
        wiring.deps[4] = vec![0, 1, 2, 3];
        let wiring = Arc::new(wiring);

        let next = rebuild(&schema_in_order(&order), &Graph::from_values(start), &wiring).unwrap();

        let updated_sum: i64 = (0..4).map(|i| start[i] + i as i64 + 1).sum();
        prop_assert_eq!(next.n4, Node(start[4] + 5 + 2 * updated_sum));
    }

    #[test]
    fn ring_cycle_reports_exact_chain(
        len in 1usize..=5,
        order in arbitrary_order(),
    ) {
        let schema = schema_in_order(&order);
        let current = Graph::from_values([0; 5]);

        let err = rebuild(&schema, &current, &ring_wiring(len)).unwrap_err();

        // The first ring member the pass visits is where the chain starts.
        let entry = order.iter().copied().find(|&index| index < len).unwrap();
        let expected: Vec<&str> = (0..=len).map(|step| NAMES[(entry + step) % len]).collect();
        prop_assert_eq!(err, TransitionError::CircularDependency { chain: expected });
    }

    #[test]
    fn initial_is_context_independent(
        start in prop::array::uniform5(-100i64..100),
        edges in prop::collection::vec(any::<bool>(), 10),
    ) {
        let before = Graph::initial().unwrap();
        let _ = rebuild(&Graph::schema().unwrap(), &Graph::from_values(start), &acyclic_wiring(&edges));
        let after = Graph::initial().unwrap();

        prop_assert_eq!(&before, &after);
        prop_assert_eq!(before, Graph::from_values([0; 5]));
        prop_assert_eq!(Node::<3>::initial(), Node::<3>::initial());
    }
}
