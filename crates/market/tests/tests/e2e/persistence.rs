//! End-to-end test: state that outlives a single engine.
//!
//! Verifies that:
//! - The self-model file written by one engine is loaded (and decayed) by the next
//! - A corrupt self-model file degrades to an empty model
//! - Capsules written to a directory ledger survive reopening

use chrono::{Duration, Utc};
use market_engine::{InnovationEngine, MarketConfig};
use market_ledger::{JsonDirLedger, Ledger};
use market_portfolio::{PlaybookRegistry, StaticPlaybook};
use market_self_model::{
    ArmOutcome, JsonFileSelfModelStore, SelfModel, SelfModelConfig, SelfModelStore,
};
use market_types::{Brief, Candidate, MechanismGraph, Obligations, RollbackContract};
use serde_json::{json, Map};
use std::path::PathBuf;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn temp_path(label: &str) -> PathBuf {
    std::env::temp_dir().join(format!("market-{}-{}", label, uuid::Uuid::new_v4()))
}

fn brief() -> Brief {
    Brief::new("brief-persist", "stabilize flaky payment retries")
        .with_context("domain", "payments")
        .with_success_pre(["input.valid"])
        .with_success_post(["tests.ok"])
}

fn registry() -> PlaybookRegistry {
    let candidate = Candidate::new("retry-1", "fixed", MechanismGraph::linear(["observe", "backoff", "verify"]))
        .with_obligations(Obligations::new(["input.valid"], ["tests.ok"]))
        .with_rollback(RollbackContract::new("config_revert", Map::new()))
        .with_evidence("tests", json!({"ok": true}))
        .with_fae(0.8)
        .with_cost_ms(25.0);
    PlaybookRegistry::new()
        .with(Arc::new(StaticPlaybook::new("fixed", vec![candidate])))
        .unwrap()
}

fn config(path: &PathBuf) -> MarketConfig {
    MarketConfig {
        mutate_outputs: false,
        self_model_path: Some(path.clone()),
        ..MarketConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Self-Model
// ---------------------------------------------------------------------------

#[tokio::test]
async fn self_model_file_carries_over_between_engines() {
    let path = temp_path("self-model").with_extension("json");
    let b = brief();

    let mut first = InnovationEngine::new(config(&path), registry()).unwrap();
    first.run(&b, 10_000, &Map::new()).await.unwrap();
    assert!(path.exists());

    let second = InnovationEngine::new(config(&path), registry()).unwrap();
    let stats = second.self_model().stats(&b.problem, &b.context, "fixed").unwrap();
    assert!(stats.trials > 0.99 && stats.trials <= 1.0);
    assert!(stats.wins > 0.99 && stats.wins <= 1.0);

    let _ = std::fs::remove_file(&path);
}

#[test]
fn stale_file_state_is_decayed_on_load() {
    let path = temp_path("self-model-decay").with_extension("json");
    let store = JsonFileSelfModelStore::new(&path);
    let b = brief();
    let two_weeks_ago = Utc::now() - Duration::days(14);

    let model = SelfModel::new(SelfModelConfig::default());
    model
        .update_at(&b.problem, &b.context, "fixed", &ArmOutcome::new(true, 1.0, 1000.0), two_weeks_ago)
        .unwrap();
    model.persist(&store).unwrap();

    // Two half-lives at the default 7 days.
    let loaded = SelfModel::load(SelfModelConfig::default(), &store, Utc::now());
    let stats = loaded.stats(&b.problem, &b.context, "fixed").unwrap();
    assert!((stats.trials - 0.25).abs() < 1e-3, "trials = {}", stats.trials);
    assert!((stats.spend_ms - 250.0).abs() < 1.0);

    let _ = std::fs::remove_file(&path);
}

#[tokio::test]
async fn corrupt_file_starts_empty() {
    let path = temp_path("self-model-corrupt").with_extension("json");
    std::fs::write(&path, "{ not json").unwrap();
    assert!(JsonFileSelfModelStore::new(&path).load().is_err());

    let mut engine = InnovationEngine::new(config(&path), registry()).unwrap();
    assert_eq!(engine.self_model().arm_count(), 0);

    // A successful run overwrites the corrupt file.
    engine.run(&brief(), 10_000, &Map::new()).await.unwrap();
    assert_eq!(JsonFileSelfModelStore::new(&path).load().unwrap().len(), 1);

    let _ = std::fs::remove_file(&path);
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

#[tokio::test]
async fn directory_ledger_survives_reopen() {
    let dir = temp_path("ledger");
    let config = MarketConfig {
        mutate_outputs: false,
        ..MarketConfig::default()
    };
    let mut engine = InnovationEngine::new(config, registry())
        .unwrap()
        .with_ledger(Arc::new(JsonDirLedger::new(&dir)));

    let run = engine.run(&brief(), 10_000, &Map::new()).await.unwrap();
    let capsule_id = run.capsule_id.unwrap();

    let reopened = JsonDirLedger::new(&dir);
    assert_eq!(reopened.list().await.unwrap(), vec![capsule_id.clone()]);
    let capsule = reopened.get(&capsule_id).await.unwrap();
    assert_eq!(capsule.decision_id, run.decision_id);
    assert!(capsule.verify_barcodes());

    let _ = std::fs::remove_dir_all(&dir);
}
