#![deny(unsafe_code)]
//! Innovation market demo binary.
//!
//! Runs a self-contained demonstration of:
//! 1. A portfolio run with template, handcrafted and failing arms
//! 2. Annotation, PCC pre-filtering and the budgeted auction
//! 3. Winner hand-off to a simulated codegen service and the ledger
//! 4. A policy-denied run and the self-model learning across runs
//!
//! No external services required -- all collaborators are simulated.

mod scenario;

use market_engine::{EngineMetrics, InnovationEngine, MarketConfig, MarketRun};
use market_handoff::{HandoffOutcome, RejectionDetails, SimulatedCodegenClient, StaticPolicy};
use market_ledger::{InMemoryLedger, Ledger};
use market_self_model::{InMemorySelfModelStore, SelfModelStore};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use scenario::Scenario;

// ── Formatting Helpers ──────────────────────────────────────────────────

const BANNER: &str = r#"
 ╔═══════════════════════════════════════════════════════════════╗
 ║               Innovation Market  --  Demo                     ║
 ║                                                               ║
 ║   Budgeted playbook portfolios, proof-gated auctions,         ║
 ║   and hashed receipts for every decision.                     ║
 ╚═══════════════════════════════════════════════════════════════╝
"#;

fn section(title: &str) {
    let width: usize = 60;
    let pad = width.saturating_sub(title.len() + 4);
    let left = pad / 2;
    let right = pad - left;
    println!();
    println!(" ┌{}┐", "─".repeat(width));
    println!(" │{}  {}  {}│", " ".repeat(left), title, " ".repeat(right));
    println!(" └{}┘", "─".repeat(width));
}

fn ok(msg: &str) {
    println!("   [OK]  {}", msg);
}

fn info(msg: &str) {
    println!("   [--]  {}", msg);
}

fn warn(msg: &str) {
    println!("   [!!]  {}", msg);
}

// ── Main ────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_target(false)
        .init();

    println!("{}", BANNER);

    if let Err(e) = run_demo().await {
        eprintln!();
        eprintln!("   [FATAL]  Demo failed: {:#}", e);
        std::process::exit(1);
    }

    println!();
    println!(" ════════════════════════════════════════════════════════════════");
    println!("  Demo complete.");
    println!(" ════════════════════════════════════════════════════════════════");
    println!();
}

async fn run_demo() -> anyhow::Result<()> {
    // ── Phase A: Configuration ──────────────────────────────────────
    section("Phase A: Configuration");

    let config = MarketConfig::demo();
    info(&format!(
        "MarketConfig::demo()  propose={:.0}%  auction={:.0}%  max_arms={}  seed={:?}",
        config.propose_share * 100.0,
        config.auction_share * 100.0,
        config.max_arms,
        config.mutation_seed
    ));

    let store = Arc::new(InMemorySelfModelStore::new());
    let ledger = Arc::new(InMemoryLedger::new());
    let codegen = Arc::new(SimulatedCodegenClient::new());

    let mut engine = InnovationEngine::new(config.clone(), Scenario::registry()?)?
        .with_self_model_store(store.clone())
        .with_ledger(ledger.clone())
        .with_codegen(codegen.clone());
    ok("InnovationEngine online  (arms: template, handcrafted, flaky)");

    // ── Phase B: Delivered Run ──────────────────────────────────────
    section("Phase B: Market Run  (budget 10000ms)");

    let brief = Scenario::checkout_brief();
    let identity = identity_context();
    let run = engine.run(&brief, 10_000, &identity).await?;
    print_run(&run);

    // ── Phase C: Policy-Denied Run ──────────────────────────────────
    section("Phase C: Policy Gate  (change ticket required)");

    let mut guarded = InnovationEngine::new(config, Scenario::registry()?)?
        .with_self_model_store(store.clone())
        .with_ledger(ledger.clone())
        .with_codegen(codegen.clone())
        .with_policy(Arc::new(
            StaticPolicy::new()
                .deny_rate_limit_key("burst")
                .require_identity_key("change_ticket"),
        ));
    let denied = guarded.run(&Scenario::burst_brief(), 10_000, &identity).await?;
    print_run(&denied);

    // ── Phase D: Self-Model ─────────────────────────────────────────
    section("Phase D: Self-Model Priors");

    let arms: Vec<String> = ["template", "handcrafted", "flaky"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    for (arm, weight) in guarded.self_model().priors(&brief.problem, &brief.context, &arms) {
        info(&format!("{:<12} prior={:.3}", arm, weight));
    }
    info(&format!("Persisted arms   : {}", store.load()?.len()));

    // ── Phase E: Ledger ─────────────────────────────────────────────
    section("Phase E: Design Capsules");

    for id in ledger.list().await? {
        let capsule = ledger.get(&id).await?;
        let barcodes = if capsule.verify_barcodes() { "verified" } else { "MISMATCH" };
        ok(&format!("{}  artifacts={}  barcodes {}", id.as_str(), capsule.artifacts.len(), barcodes));
        ledger
            .annotate(&id, "review", json!({"reviewer": "demo", "verdict": "approved"}))
            .await?;
    }
    info(&format!("Codegen submissions: {}", codegen.submissions().len()));

    // ── Phase F: Metrics ────────────────────────────────────────────
    section("Phase F: Engine Metrics");

    print_metrics("default policy", engine.metrics());
    print_metrics("guarded policy", guarded.metrics());

    Ok(())
}

fn identity_context() -> Map<String, Value> {
    let mut identity = Map::new();
    identity.insert("principal".into(), json!("demo-operator"));
    identity.insert("tenant".into(), json!("acme"));
    identity
}

// ── Display Helpers ─────────────────────────────────────────────────────

fn print_run(run: &MarketRun) {
    info(&format!("Decision         : {}", run.decision_id));
    for arm in &run.portfolio_arms_used {
        match &arm.error {
            None => ok(&format!(
                "arm {:<12} alloc={:>5}ms  produced={}",
                arm.name, arm.allocation_ms, arm.produced
            )),
            Some(code) => warn(&format!("arm {:<12} alloc={:>5}ms  error={}", arm.name, arm.allocation_ms, code)),
        }
    }
    info(&format!("Auction entrants : {}", run.candidates.len()));
    for entry in &run.auction.market_receipt.ranked {
        info(&format!(
            "  {:<28} value={:.3}  fae={:.3}  cost={:.0}ms",
            entry.candidate_id, entry.value, entry.fae, entry.cost_ms
        ));
    }
    let receipt = &run.auction.market_receipt;
    info(&format!(
        "Receipt          : rule={}  spend={}ms  hash={}",
        receipt.rule.as_str(),
        receipt.spend_ms,
        &receipt.hash.to_hex()[..16]
    ));
    if receipt.verify() {
        ok("Receipt hash verified");
    } else {
        warn("Receipt hash mismatch");
    }

    match &run.handoff {
        HandoffOutcome::Delivered(receipt) => ok(&format!(
            "Delivered {}  ticket={}  capsule={}",
            receipt.winner_id,
            receipt.ticket.ticket_id,
            receipt.capsule_id.as_str()
        )),
        HandoffOutcome::Rejected { stage, details } => {
            let why = match details {
                RejectionDetails::Proof(proof) => format!("{} violations", proof.violations.len()),
                RejectionDetails::Policy(verdict) => verdict.reasons.join(", "),
                RejectionDetails::Error { code, .. } => code.clone(),
            };
            warn(&format!("Rejected at {}  ({})", stage.as_str(), why));
        }
    }
}

fn print_metrics(label: &str, m: &EngineMetrics) {
    info(&format!("[{}]", label));
    info(&format!("  Runs               : {}", m.runs));
    info(&format!("  Delivered          : {}", m.handoffs_delivered));
    info(&format!("  Policy rejections  : {}", m.policy_rejections));
    info(&format!("  Candidates offered : {}", m.candidates_generated));
    info(&format!("  Deduplicated       : {}", m.candidates_deduplicated));
    info(&format!("  PCC filtered       : {}", m.candidates_pcc_filtered));
    info(&format!("  Arm failures       : {}", m.arm_failures));
    info(&format!("  Delivery rate      : {:.0}%", m.delivery_rate() * 100.0));
}
