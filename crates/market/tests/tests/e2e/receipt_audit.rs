//! End-to-end test: auction receipts and design capsules are auditable.
//!
//! Verifies that:
//! - Receipt hashes are stable and detect tampering
//! - Capsules carry barcodes, counterfactuals and the engine's cost/env pins
//! - Capsules are write-once apart from new annotation keys

use market_auction::{auction, rank, AuctionRule};
use market_engine::{InnovationEngine, MarketConfig};
use market_ledger::{DesignCapsule, Ledger};
use market_portfolio::{PlaybookRegistry, StaticPlaybook};
use market_types::{Brief, Candidate, CapsuleId, MechanismGraph, Obligations, RollbackContract};
use serde_json::{json, Map};
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn candidate(id: &str, nodes: &[&str], fae: f64, cost_ms: f64) -> Candidate {
    Candidate::new(id, "fixed", MechanismGraph::linear(nodes.iter().copied()))
        .with_obligations(Obligations::new(["input.valid"], ["tests.ok"]))
        .with_rollback(RollbackContract::new("undo", Map::new()))
        .with_evidence("tests", json!({"ok": true}))
        .with_fae(fae)
        .with_cost_ms(cost_ms)
}

fn field() -> Vec<Candidate> {
    vec![
        candidate("alpha", &["a", "b"], 0.8, 600.0),
        candidate("beta", &["a", "c"], 0.7, 600.0),
        candidate("gamma", &["a", "d"], 0.5, 300.0),
    ]
}

// ---------------------------------------------------------------------------
// Receipts
// ---------------------------------------------------------------------------

#[test]
fn greedy_skips_unaffordable_runner_up() {
    let result = auction(&field(), 1_000);
    assert_eq!(result.winners, vec!["alpha", "gamma"]);
    assert_eq!(result.spend_ms, 900.0);
    let ranked: Vec<&str> = result
        .market_receipt
        .ranked
        .iter()
        .map(|e| e.candidate_id.as_str())
        .collect();
    assert_eq!(ranked, vec!["alpha", "beta", "gamma"]);
}

#[test]
fn zero_budget_selects_top_only() {
    let result = auction(&field(), 0);
    assert_eq!(result.winners, vec!["alpha"]);
    assert_eq!(result.market_receipt.rule, AuctionRule::Top1NoBudget);
    assert_eq!(result.spend_ms, 600.0);

    let negative = auction(&field(), -5);
    assert_eq!(negative.winners, vec!["alpha"]);
}

#[test]
fn receipt_hash_is_stable_and_tamper_evident() {
    let a = auction(&field(), 1_000);
    let mut reversed = field();
    reversed.reverse();
    let b = auction(&reversed, 1_000);
    assert_eq!(a.market_receipt.hash, b.market_receipt.hash);

    let mut tampered = a.market_receipt.clone();
    tampered.selected = vec!["beta".into()];
    assert!(!tampered.verify());
    assert!(a.market_receipt.verify());

    let json = serde_json::to_value(&a.market_receipt).unwrap();
    assert_eq!(json["rule"], "greedy_value_within_budget");
}

#[test]
fn rank_matches_receipt() {
    assert_eq!(rank(&field()), auction(&field(), 1_000).market_receipt.ranked);
}

// ---------------------------------------------------------------------------
// Capsules
// ---------------------------------------------------------------------------

async fn delivered_capsule() -> (InnovationEngine, DesignCapsule) {
    let registry = PlaybookRegistry::new()
        .with(Arc::new(StaticPlaybook::new("fixed", field())))
        .unwrap();
    let config = MarketConfig {
        mutate_outputs: false,
        ..MarketConfig::default()
    };
    let mut engine = InnovationEngine::new(config, registry).unwrap();
    let brief = Brief::new("brief-audit", "speed up invoice rendering")
        .with_success_pre(["input.valid"])
        .with_success_post(["tests.ok"]);

    // Auction share: 1000ms.
    let run = engine.run(&brief, 5_000, &Map::new()).await.unwrap();
    let capsule_id = run.capsule_id.clone().unwrap();
    let capsule = engine.ledger().get(&capsule_id).await.unwrap();
    (engine, capsule)
}

#[tokio::test]
async fn capsule_records_run_context() {
    let (_engine, capsule) = delivered_capsule().await;

    assert!(capsule.verify_barcodes());
    for name in ["winner", "patch_brief", "market_receipt"] {
        assert!(capsule.barcodes.contains_key(name), "missing barcode for {}", name);
    }
    assert_eq!(capsule.artifacts["winner"]["id"], "alpha");
    assert_eq!(capsule.artifacts["market_receipt"]["selected"], json!(["alpha", "gamma"]));

    let counterfactuals: Vec<(&str, bool)> = capsule
        .counterfactuals
        .iter()
        .map(|c| (c["candidate_id"].as_str().unwrap(), c["selected"].as_bool().unwrap()))
        .collect();
    assert_eq!(counterfactuals, vec![("beta", false), ("gamma", true)]);

    assert_eq!(capsule.cost_breakdown["total_budget_ms"], 5_000.0);
    assert_eq!(capsule.cost_breakdown["auction_budget_ms"], 1_000.0);
    assert_eq!(capsule.cost_breakdown["auction_spend_ms"], 900.0);
    assert_eq!(capsule.env["pcc_prefilter"], true);
    assert_eq!(capsule.eval_logs.len(), 3);
    assert_eq!(capsule.playbook_dag["compiled"]["alpha"], json!([0, 1]));
}

#[tokio::test]
async fn capsules_are_write_once() {
    let (engine, capsule) = delivered_capsule().await;
    let ledger = engine.ledger();

    let err = ledger.put(capsule.clone()).await.unwrap_err();
    assert_eq!(err.code(), "ledger.capsule.duplicate");

    ledger
        .annotate(&capsule.capsule_id, "postmortem", json!({"regressions": 0}))
        .await
        .unwrap();
    let err = ledger
        .annotate(&capsule.capsule_id, "postmortem", json!({"regressions": 3}))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "ledger.annotation.exists");

    let stored = ledger.get(&capsule.capsule_id).await.unwrap();
    assert_eq!(stored.annotations["postmortem"]["regressions"], 0);
    assert_eq!(stored.artifacts, capsule.artifacts);

    let unknown = ledger.get(&CapsuleId::from("cap:unknown")).await.unwrap();
    assert!(unknown.is_empty());
}
