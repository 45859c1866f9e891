//! Property tests: the auction is a pure, order-independent function of its inputs.

use market_auction::{auction, value, AuctionRule};
use market_types::{Candidate, MechanismGraph};
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

fn arb_candidates() -> impl Strategy<Value = Vec<Candidate>> {
    prop::collection::vec(
        (0.0f64..1.0, 0.0f64..1.0, 0.0f64..1.0, 0.0f64..500.0),
        0..12,
    )
    .prop_map(|scores| {
        scores
            .into_iter()
            .enumerate()
            .map(|(i, (fae, novelty, risk, cost))| {
                Candidate::new(format!("c{:02}", i), "pb", MechanismGraph::linear(["a"]))
                    .with_fae(fae)
                    .with_novelty(novelty)
                    .with_risk(risk)
                    .with_cost_ms(cost)
            })
            .collect()
    })
}

fn candidate(id: &str, fae: f64, novelty: f64, risk: f64) -> Candidate {
    Candidate::new(id, "pb", MechanismGraph::linear(["a"]))
        .with_fae(fae)
        .with_novelty(novelty)
        .with_risk(risk)
        .with_cost_ms(1.0)
}

// ---------------------------------------------------------------------------
// Property Tests
// ---------------------------------------------------------------------------

proptest! {
    /// Identical inputs give identical winners and receipt hash.
    #[test]
    fn repeated_auctions_agree(candidates in arb_candidates(), budget in -100i64..3000) {
        let a = auction(&candidates, budget);
        let b = auction(&candidates, budget);
        prop_assert_eq!(&a.winners, &b.winners);
        prop_assert_eq!(&a.market_receipt.hash, &b.market_receipt.hash);
        prop_assert!(a.market_receipt.verify());
    }

    /// Input order does not affect the outcome.
    #[test]
    fn shuffling_inputs_is_irrelevant(
        (candidates, shuffled) in arb_candidates().prop_flat_map(|c| (Just(c.clone()), Just(c).prop_shuffle())),
        budget in 1i64..3000,
    ) {
        let a = auction(&candidates, budget);
        let b = auction(&shuffled, budget);
        prop_assert_eq!(a.winners, b.winners);
        prop_assert_eq!(a.market_receipt.hash, b.market_receipt.hash);
    }

    /// Positive budgets are never overspent and ranking is by value.
    #[test]
    fn budget_respected(candidates in arb_candidates(), budget in 1i64..3000) {
        let result = auction(&candidates, budget);
        prop_assert_eq!(result.market_receipt.rule, AuctionRule::GreedyValueWithinBudget);
        prop_assert!(result.spend_ms <= budget as f64);
        let ranked = &result.market_receipt.ranked;
        prop_assert_eq!(ranked.len(), candidates.len());
        for pair in ranked.windows(2) {
            prop_assert!(pair[0].value >= pair[1].value);
        }
        for c in &candidates {
            let entry = ranked.iter().find(|e| e.candidate_id == c.id).unwrap();
            prop_assert_eq!(entry.value, value(&c.scores));
        }
    }

    /// Non-positive budgets select exactly the top candidate.
    #[test]
    fn no_budget_selects_top(candidates in arb_candidates(), budget in -100i64..=0) {
        let result = auction(&candidates, budget);
        prop_assert_eq!(result.market_receipt.rule, AuctionRule::Top1NoBudget);
        prop_assert_eq!(result.winners.len(), candidates.len().min(1));
        if let Some(top) = result.market_receipt.ranked.first() {
            prop_assert_eq!(&result.winners[0], &top.candidate_id);
        }
    }

    /// Fully tied candidates are ordered by id whatever the input order.
    #[test]
    fn full_ties_break_on_id(
        ids in Just(vec!["delta", "alpha", "charlie", "bravo"]).prop_shuffle(),
    ) {
        let candidates: Vec<Candidate> = ids.iter().map(|id| candidate(id, 0.5, 0.5, 0.5)).collect();
        let result = auction(&candidates, 100);
        prop_assert_eq!(result.winners, vec!["alpha", "bravo", "charlie", "delta"]);
    }
}

#[test]
fn equal_value_prefers_lower_risk_then_higher_novelty() {
    // Values: low_risk 0.6, high_risk 0.7 - 0.1 = 0.6.
    let low_risk = candidate("z-low-risk", 0.6, 0.0, 0.0);
    let high_risk = candidate("a-high-risk", 0.7, 0.0, 1.0);
    let result = auction(&[high_risk, low_risk], 100);
    assert_eq!(result.winners, vec!["z-low-risk", "a-high-risk"]);

    // Values: novel 0.5 + 0.05 = 0.55, plain 0.55.
    let novel = candidate("z-novel", 0.5, 1.0, 0.0);
    let plain = candidate("a-plain", 0.55, 0.0, 0.0);
    let result = auction(&[plain, novel], 100);
    assert_eq!(result.winners, vec!["z-novel", "a-plain"]);
}
