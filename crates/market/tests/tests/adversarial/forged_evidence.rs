//! Adversarial test: playbooks cannot vouch for their own proofs.
//!
//! A playbook may attach a `pcc` entry claiming success; the annotator keeps
//! it (evidence is write-once) but every gate re-runs the verifier.

use market_engine::{InnovationEngine, MarketConfig};
use market_evaluation::EvaluationAnnotator;
use market_handoff::HandoffStage;
use market_portfolio::{PlaybookRegistry, StaticPlaybook};
use market_types::{Brief, Candidate, MechanismGraph, Obligations, RollbackContract};
use serde_json::{json, Map};
use std::sync::Arc;

fn brief() -> Brief {
    Brief::new("brief-forged", "raise cache hit ratio")
        .with_success_pre(["input.valid"])
        .with_success_post(["tests.ok"])
}

/// Failing tests, but a forged passing `pcc` entry and a top score.
fn forged() -> Candidate {
    Candidate::new("forged", "rogue", MechanismGraph::linear(["claim", "ship"]))
        .with_obligations(Obligations::new(["input.valid"], ["tests.ok"]))
        .with_rollback(RollbackContract::new("undo", Map::new()))
        .with_evidence("tests", json!({"ok": false}))
        .with_evidence("pcc", json!({"ok": true, "violations": []}))
        .with_fae(1.0)
        .with_cost_ms(10.0)
}

fn honest() -> Candidate {
    Candidate::new("honest", "steady", MechanismGraph::linear(["measure", "tune", "verify"]))
        .with_obligations(Obligations::new(["input.valid"], ["tests.ok"]))
        .with_rollback(RollbackContract::new("undo", Map::new()))
        .with_evidence("tests", json!({"ok": true}))
        .with_fae(0.4)
        .with_cost_ms(10.0)
}

fn registry() -> PlaybookRegistry {
    PlaybookRegistry::new()
        .with(Arc::new(StaticPlaybook::new("rogue", vec![forged()])))
        .unwrap()
        .with(Arc::new(StaticPlaybook::new("steady", vec![honest()])))
        .unwrap()
}

#[test]
fn annotator_keeps_first_pcc_entry() {
    let mut c = forged();
    EvaluationAnnotator::new().annotate(&mut c);
    assert_eq!(c.evidence.get("pcc").unwrap()["ok"], true);
}

#[tokio::test]
async fn prefilter_reruns_the_verifier() {
    let config = MarketConfig {
        mutate_outputs: false,
        ..MarketConfig::default()
    };
    let mut engine = InnovationEngine::new(config, registry()).unwrap();
    let run = engine.run(&brief(), 10_000, &Map::new()).await.unwrap();

    assert!(run.candidates.iter().all(|c| c.id != "forged"));
    assert_eq!(run.winners, vec!["honest"]);
    assert!(run.delivered());
}

#[tokio::test]
async fn winner_gate_reruns_the_verifier() {
    let config = MarketConfig {
        mutate_outputs: false,
        pcc_prefilter: false,
        ..MarketConfig::default()
    };
    let mut engine = InnovationEngine::new(config, registry()).unwrap();
    let run = engine.run(&brief(), 10_000, &Map::new()).await.unwrap();

    assert_eq!(run.winners[0], "forged");
    assert_eq!(run.handoff.rejected_stage(), Some(HandoffStage::ProofValidation));
    assert!(engine.ledger().list().await.unwrap().is_empty());
}
