//! Property tests: mutation preserves lint validity and is deterministic.

use market_mechanism::{lint, Mutator};
use market_types::{MechanismGraph, Op};
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

/// Lint-valid DAGs with numeric and non-numeric parameters.
fn arb_dag() -> impl Strategy<Value = MechanismGraph> {
    (
        prop::collection::vec(
            (
                prop_oneof![Just("plan"), Just("draft"), Just("critique"), Just("repair")],
                -1000i64..1000,
                0.0f64..10.0,
            ),
            1..6,
        ),
        prop::collection::vec((0usize..6, 0usize..6), 0..8),
    )
        .prop_map(|(ops, pairs)| {
            let n = ops.len();
            let mut graph = MechanismGraph::new();
            for (name, depth, temperature) in ops {
                graph = graph.with_op(
                    Op::new(name)
                        .with_param("depth", depth)
                        .with_param("temperature", temperature)
                        .with_param("label", "keep"),
                );
            }
            for (a, b) in pairs {
                let (a, b) = (a % n, b % n);
                if a < b {
                    graph = graph.with_edge(a, b);
                }
            }
            graph
        })
}

// ---------------------------------------------------------------------------
// Property Tests
// ---------------------------------------------------------------------------

proptest! {
    /// A lint-valid input yields either nothing or a lint-valid graph.
    #[test]
    fn mutation_stays_valid(graph in arb_dag(), seed in prop::option::of(any::<u64>())) {
        prop_assume!(lint(&graph).is_valid());
        let mutator = match seed {
            Some(seed) => Mutator::new().with_seed(seed),
            None => Mutator::new(),
        };
        if let Some(mutated) = mutator.mutate(&graph) {
            prop_assert!(lint(&mutated).is_valid());
            prop_assert!(mutated.has_op("batch"));
            prop_assert!(mutated.has_named_edge("critique", "repair"));
            prop_assert!(mutated.node_count() >= graph.node_count());
        }
    }

    /// Identical inputs produce identical variants.
    #[test]
    fn mutation_is_deterministic(graph in arb_dag(), seed in any::<u64>()) {
        let mutator = Mutator::new().with_seed(seed);
        prop_assert_eq!(mutator.mutate(&graph), mutator.mutate(&graph));
    }

    /// Non-numeric parameters survive untouched.
    #[test]
    fn strings_are_not_jittered(graph in arb_dag()) {
        if let Some(mutated) = Mutator::new().mutate(&graph) {
            for (before, after) in graph.nodes.iter().zip(&mutated.nodes) {
                prop_assert_eq!(&before.params["label"], &after.params["label"]);
            }
        }
    }
}
