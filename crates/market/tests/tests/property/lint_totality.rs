//! Property tests: lint is total over arbitrary graphs and always catches cycles.

use market_mechanism::{lint, topological_order};
use market_types::{Edge, MechanismGraph, Op};
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

fn arb_ops(max: usize) -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec(
        prop_oneof![
            Just("analyze"),
            Just("design"),
            Just("critique"),
            Just("repair"),
            Just("batch"),
        ],
        0..max,
    )
    .prop_map(|names| names.into_iter().map(Op::new).collect())
}

/// Edges with arbitrary arity and possibly out-of-range or negative indices.
fn arb_raw_edges() -> impl Strategy<Value = Vec<Edge>> {
    prop::collection::vec(prop::collection::vec(-2i64..8, 0..4).prop_map(Edge), 0..10)
}

// ---------------------------------------------------------------------------
// Property Tests
// ---------------------------------------------------------------------------

proptest! {
    /// Lint never panics and a valid report always yields a full topological order.
    #[test]
    fn lint_is_total(nodes in arb_ops(7), edges in arb_raw_edges()) {
        let graph = MechanismGraph { nodes, edges };
        let before = graph.clone();
        let report = lint(&graph);
        prop_assert_eq!(&graph, &before);

        match topological_order(&graph) {
            Ok(order) => {
                prop_assert!(report.is_valid());
                prop_assert_eq!(order.len(), graph.node_count());
            }
            Err(_) => prop_assert!(!report.is_valid()),
        }
        if graph.node_count() == 0 {
            prop_assert!(report.has_failure("mechanism.graph.empty"));
        }
    }

    /// Any ring of length >= 2 embedded in a graph fails with a cycle.
    #[test]
    fn rings_are_cycles(n in 2usize..8, ring_len in 2usize..8, extra in prop::collection::vec((0usize..8, 0usize..8), 0..6)) {
        let ring_len = ring_len.min(n);
        let mut graph = MechanismGraph::new();
        for i in 0..n {
            graph = graph.with_op(Op::new(format!("op{}", i)));
        }
        for i in 0..ring_len {
            graph = graph.with_edge(i, (i + 1) % ring_len);
        }
        for (from, to) in extra {
            graph = graph.with_edge(from % n, to % n);
        }

        let report = lint(&graph);
        prop_assert!(report.has_failure("mechanism.graph.cycle"));
        prop_assert!(topological_order(&graph).is_err());
    }

    /// Forward-only edges never form a cycle.
    #[test]
    fn forward_edges_are_acyclic(n in 1usize..8, pairs in prop::collection::vec((0usize..8, 0usize..8), 0..12)) {
        let mut graph = MechanismGraph::new();
        for i in 0..n {
            graph = graph.with_op(Op::new(format!("op{}", i)));
        }
        for (a, b) in pairs {
            let (a, b) = (a % n, b % n);
            if a < b {
                graph = graph.with_edge(a, b);
            }
        }
        let order = topological_order(&graph).unwrap();
        let position: Vec<usize> = {
            let mut pos = vec![0; n];
            for (i, &node) in order.iter().enumerate() {
                pos[node] = i;
            }
            pos
        };
        for edge in &graph.edges {
            let (from, to) = edge.indices(n).unwrap();
            prop_assert!(position[from] < position[to]);
        }
    }
}
