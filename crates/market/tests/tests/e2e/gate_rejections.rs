//! End-to-end test: winner pipeline gates and failure surfaces.
//!
//! Verifies that:
//! - Proof and policy gate failures are reported as rejected outcomes
//! - An unreachable policy authority fails closed
//! - Codegen failures abort the hand-off without writing a capsule
//! - An auction without winners is a caller error

use market_auction::auction;
use market_engine::{EngineError, InnovationEngine, MarketConfig};
use market_handoff::{
    AllowAllPolicy, CapsuleContext, CodegenError, HandoffError, HandoffOutcome, HandoffRequest,
    HandoffStage, PolicyAuthority, RejectionDetails, SimulatedCodegenClient, StaticPolicy,
    WinnerPipeline,
};
use market_ledger::{InMemoryLedger, Ledger};
use market_portfolio::{PlaybookRegistry, StaticPlaybook};
use market_proof::ProofVerifier;
use market_types::{
    Brief, CapabilitySpec, Candidate, DecisionId, MechanismGraph, Obligations, RollbackContract,
};
use serde_json::{json, Map, Value};
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn brief() -> Brief {
    Brief::new("brief-gates", "retire legacy session store")
        .with_success_pre(["input.valid"])
        .with_success_post(["tests.ok", "sessions.migrated"])
}

fn passing() -> Candidate {
    Candidate::new("pass", "pb", MechanismGraph::linear(["copy", "dual_write", "cutover"]))
        .with_obligations(Obligations::new(["input.valid"], ["tests.ok", "sessions.migrated"]))
        .with_rollback(RollbackContract::new("dual_write_revert", Map::new()))
        .with_evidence("tests", json!({"ok": true}))
        .with_fae(0.6)
        .with_cost_ms(100.0)
}

struct Harness {
    ledger: Arc<InMemoryLedger>,
    codegen: Arc<SimulatedCodegenClient>,
    pipeline: WinnerPipeline,
}

fn harness(policy: Arc<dyn PolicyAuthority>, codegen: SimulatedCodegenClient) -> Harness {
    let ledger = Arc::new(InMemoryLedger::new());
    let codegen = Arc::new(codegen);
    let pipeline = WinnerPipeline::new(
        Arc::new(ProofVerifier),
        policy,
        codegen.clone(),
        ledger.clone(),
    );
    Harness {
        ledger,
        codegen,
        pipeline,
    }
}

async fn hand_off(
    h: &Harness,
    candidates: &[Candidate],
    identity: &Map<String, Value>,
) -> Result<HandoffOutcome, HandoffError> {
    let b = brief();
    let decision = DecisionId::new();
    let result = auction(candidates, 1_000);
    let outcome = h
        .pipeline
        .handoff(HandoffRequest {
            brief: &b,
            decision_id: &decision,
            candidates,
            auction: &result,
            identity_context: identity,
            context: CapsuleContext::default(),
        })
        .await;
    outcome
}

// ---------------------------------------------------------------------------
// Proof Gate
// ---------------------------------------------------------------------------

#[tokio::test]
async fn missing_brief_post_key_rejected() {
    let c = passing().with_obligations(Obligations::new(["input.valid"], ["tests.ok"]));
    let h = harness(Arc::new(AllowAllPolicy), SimulatedCodegenClient::new());

    let outcome = hand_off(&h, &[c], &Map::new()).await.unwrap();
    match outcome {
        HandoffOutcome::Rejected {
            stage: HandoffStage::ProofValidation,
            details: RejectionDetails::Proof(proof),
        } => {
            assert!(!proof.ok);
            assert!(proof.has_violation("obligation.post.missing:sessions.migrated"));
        }
        other => panic!("expected proof rejection, got {:?}", other),
    }
    assert!(h.codegen.submissions().is_empty());
    assert!(h.ledger.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn unknown_rate_limit_rejected() {
    let mut c = passing();
    let mut capability = CapabilitySpec::new().with_rate_limit("tokens_per_minute", 10);
    capability.obligations = c.obligations.clone();
    capability.rollback = c.rollback.clone();
    c = c.with_capability(capability);
    let h = harness(Arc::new(AllowAllPolicy), SimulatedCodegenClient::new());

    let outcome = hand_off(&h, &[c], &Map::new()).await.unwrap();
    assert_eq!(outcome.rejected_stage(), Some(HandoffStage::ProofValidation));
    let json = serde_json::to_value(&outcome).unwrap();
    assert_eq!(json["outcome"], "rejected");
    assert_eq!(json["stage"], "proof_validation");
}

// ---------------------------------------------------------------------------
// Policy Gate
// ---------------------------------------------------------------------------

#[tokio::test]
async fn missing_identity_key_denied() {
    let policy = StaticPolicy::new().require_identity_key("approver");
    let h = harness(Arc::new(policy), SimulatedCodegenClient::new());

    let outcome = hand_off(&h, &[passing()], &Map::new()).await.unwrap();
    match outcome {
        HandoffOutcome::Rejected {
            stage: HandoffStage::PolicyValidation,
            details: RejectionDetails::Policy(verdict),
        } => {
            assert!(!verdict.allowed);
            assert_eq!(verdict.reasons, vec!["identity.missing:approver"]);
        }
        other => panic!("expected policy denial, got {:?}", other),
    }

    let mut identity = Map::new();
    identity.insert("approver".into(), json!("oncall"));
    let outcome = hand_off(&h, &[passing()], &identity).await.unwrap();
    assert!(outcome.is_delivered());
}

#[tokio::test]
async fn unreachable_policy_fails_closed() {
    let h = harness(
        Arc::new(StaticPolicy::unreachable("authority timed out")),
        SimulatedCodegenClient::new(),
    );
    let outcome = hand_off(&h, &[passing()], &Map::new()).await.unwrap();
    match outcome {
        HandoffOutcome::Rejected {
            stage: HandoffStage::PolicyValidation,
            details: RejectionDetails::Error { code, .. },
        } => assert_eq!(code, "policy.unreachable"),
        other => panic!("expected fail-closed rejection, got {:?}", other),
    }
    assert!(h.codegen.submissions().is_empty());
}

// ---------------------------------------------------------------------------
// Codegen and Caller Errors
// ---------------------------------------------------------------------------

#[tokio::test]
async fn codegen_failure_aborts_without_capsule() {
    let h = harness(
        Arc::new(AllowAllPolicy),
        SimulatedCodegenClient::failing(CodegenError::Unavailable("queue full".into())),
    );
    let err = hand_off(&h, &[passing()], &Map::new()).await.unwrap_err();
    assert_eq!(err.code(), "codegen.unavailable");
    assert!(h.ledger.list().await.unwrap().is_empty());
}

#[tokio::test]
async fn no_winners_is_an_error() {
    let h = harness(Arc::new(AllowAllPolicy), SimulatedCodegenClient::new());
    let err = hand_off(&h, &[], &Map::new()).await.unwrap_err();
    assert!(matches!(err, HandoffError::NoWinners));
    assert_eq!(err.code(), "no_winners_in_auction_result");
}

#[tokio::test]
async fn engine_surfaces_no_winners_and_malformed_briefs() {
    let registry = PlaybookRegistry::new()
        .with(Arc::new(StaticPlaybook::new("empty", vec![])))
        .unwrap();
    let mut engine = InnovationEngine::new(MarketConfig::default(), registry).unwrap();

    let err = engine.run(&brief(), 10_000, &Map::new()).await.unwrap_err();
    assert_eq!(err.code(), "no_winners_in_auction_result");

    let err = engine
        .run(&Brief::new("", "anything"), 10_000, &Map::new())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::MalformedBrief(_)));
    assert_eq!(engine.metrics().runs, 1);
    assert_eq!(engine.metrics().no_winner_runs, 1);
}
