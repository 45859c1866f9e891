//! Property tests: a candidate is novel when either structural dimension is new.

use market_novelty::{NoveltyReservoir, NoveltyVerdict};
use market_types::{CapabilitySpec, Candidate, MechanismGraph};
use proptest::prelude::*;

fn candidate(id: usize, mechanism: u8, capability: u8) -> Candidate {
    Candidate::new(
        format!("c{}", id),
        "pb",
        MechanismGraph::linear([format!("op{}", mechanism)]),
    )
    .with_capability(CapabilitySpec::new().with_io("variant", capability))
}

proptest! {
    /// Acceptance matches OR-novelty over previously accepted hashes.
    #[test]
    fn acceptance_is_or_of_dimensions(pairs in prop::collection::vec((0u8..4, 0u8..4), 1..20)) {
        let mut reservoir = NoveltyReservoir::new();
        let mut seen_mechanisms = Vec::new();
        let mut seen_capabilities = Vec::new();

        for (i, (m, c)) in pairs.into_iter().enumerate() {
            let new_m = !seen_mechanisms.contains(&m);
            let new_c = !seen_capabilities.contains(&c);
            let verdict = reservoir.offer(&candidate(i, m, c));
            prop_assert_eq!(verdict.accepted(), new_m || new_c);
            let expected = match (new_m, new_c) {
                (true, true) => NoveltyVerdict::NovelBoth,
                (true, false) => NoveltyVerdict::NovelMechanism,
                (false, true) => NoveltyVerdict::NovelCapability,
                (false, false) => NoveltyVerdict::Duplicate,
            };
            prop_assert_eq!(verdict, expected);
            if verdict.accepted() {
                seen_mechanisms.push(m);
                seen_capabilities.push(c);
            }
        }
    }

    /// The portfolio filter keeps at most `k`, in input order.
    #[test]
    fn filter_portfolio_caps_and_keeps_order(pairs in prop::collection::vec((0u8..4, 0u8..4), 0..20), k in 0usize..6) {
        let candidates: Vec<Candidate> = pairs
            .iter()
            .enumerate()
            .map(|(i, &(m, c))| candidate(i, m, c))
            .collect();
        let kept = NoveltyReservoir::new().filter_portfolio(candidates, k);
        prop_assert!(kept.len() <= k);
        let indices: Vec<usize> = kept.iter().map(|c| c.id[1..].parse().unwrap()).collect();
        let mut sorted = indices.clone();
        sorted.sort_unstable();
        prop_assert_eq!(indices, sorted);
    }
}
