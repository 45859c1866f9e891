use crate::codegen::{CodegenClient, CodegenTicket, PatchBrief};
use crate::error::HandoffError;
use crate::policy::{PolicyAuthority, PolicyRequest, PolicyVerdict};
use market_auction::AuctionResult;
use market_ledger::{DesignCapsule, Ledger};
use market_proof::{ContractVerifier, ProofResult};
use market_types::{Brief, Candidate, CapsuleId, DecisionId};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

/// Gate at which a winner was turned away.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandoffStage {
    ProofValidation,
    PolicyValidation,
}

impl HandoffStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProofValidation => "proof_validation",
            Self::PolicyValidation => "policy_validation",
        }
    }
}

impl fmt::Display for HandoffStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a gate rejected the winner.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RejectionDetails {
    Proof(ProofResult),
    Policy(PolicyVerdict),
    /// The gate itself could not run; treated as a rejection.
    Error { code: String, message: String },
}

/// Receipt of a delivered winner.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HandoffReceipt {
    pub ok: bool,
    pub decision_id: DecisionId,
    pub winner_id: String,
    pub ticket: CodegenTicket,
    pub capsule_id: CapsuleId,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum HandoffOutcome {
    Delivered(HandoffReceipt),
    Rejected {
        stage: HandoffStage,
        details: RejectionDetails,
    },
}

impl HandoffOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Self::Delivered(_))
    }

    pub fn receipt(&self) -> Option<&HandoffReceipt> {
        match self {
            Self::Delivered(r) => Some(r),
            Self::Rejected { .. } => None,
        }
    }

    pub fn rejected_stage(&self) -> Option<HandoffStage> {
        match self {
            Self::Rejected { stage, .. } => Some(*stage),
            Self::Delivered(_) => None,
        }
    }
}

/// Run-level context folded into the design capsule.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CapsuleContext {
    pub playbook_dag: Value,
    pub cost_breakdown: BTreeMap<String, f64>,
    pub env: BTreeMap<String, Value>,
}

/// Inputs of one hand-off.
pub struct HandoffRequest<'a> {
    pub brief: &'a Brief,
    pub decision_id: &'a DecisionId,
    pub candidates: &'a [Candidate],
    pub auction: &'a AuctionResult,
    pub identity_context: &'a Map<String, Value>,
    pub context: CapsuleContext,
}

/// Winner pipeline: proof gate, policy gate, codegen submission, capsule.
///
/// The capsule is written only after every gate has passed and the patch
/// brief was accepted.
pub struct WinnerPipeline {
    verifier: Arc<dyn ContractVerifier>,
    policy: Arc<dyn PolicyAuthority>,
    codegen: Arc<dyn CodegenClient>,
    ledger: Arc<dyn Ledger>,
}

impl WinnerPipeline {
    pub fn new(
        verifier: Arc<dyn ContractVerifier>,
        policy: Arc<dyn PolicyAuthority>,
        codegen: Arc<dyn CodegenClient>,
        ledger: Arc<dyn Ledger>,
    ) -> Self {
        Self {
            verifier,
            policy,
            codegen,
            ledger,
        }
    }

    pub fn ledger(&self) -> &Arc<dyn Ledger> {
        &self.ledger
    }

    pub async fn handoff(&self, request: HandoffRequest<'_>) -> Result<HandoffOutcome, HandoffError> {
        let HandoffRequest {
            brief,
            decision_id,
            candidates,
            auction,
            identity_context,
            context,
        } = request;

        // Winners in auction order.
        let winners: Vec<&Candidate> = auction
            .winners
            .iter()
            .filter_map(|id| candidates.iter().find(|c| &c.id == id))
            .collect();
        let winner = *winners.first().ok_or(HandoffError::NoWinners)?;

        // Gate 1: extended proof against the brief's success criteria.
        let proof = match self.verifier.check_candidate_extended(winner, &brief.success) {
            Ok(proof) if proof.ok => proof,
            Ok(proof) => {
                warn!(decision = %decision_id, winner = %winner.id, violations = ?proof.violations, "winner failed proof validation");
                return Ok(HandoffOutcome::Rejected {
                    stage: HandoffStage::ProofValidation,
                    details: RejectionDetails::Proof(proof),
                });
            }
            Err(e) => {
                warn!(decision = %decision_id, winner = %winner.id, code = e.code(), error = %e, "proof verifier failed");
                return Ok(HandoffOutcome::Rejected {
                    stage: HandoffStage::ProofValidation,
                    details: RejectionDetails::Error {
                        code: e.code().to_string(),
                        message: e.to_string(),
                    },
                });
            }
        };

        // Gate 2: policy authority, fail-closed.
        let policy_request = PolicyRequest {
            decision_id: decision_id.clone(),
            candidate_id: winner.id.clone(),
            capability_spec: winner.capability().clone(),
            obligations: winner.obligations.clone(),
            identity_context: identity_context.clone(),
        };
        let verdict = match self.policy.validate(&policy_request).await {
            Ok(verdict) if verdict.allowed => verdict,
            Ok(verdict) => {
                warn!(decision = %decision_id, winner = %winner.id, reasons = ?verdict.reasons, "winner denied by policy");
                return Ok(HandoffOutcome::Rejected {
                    stage: HandoffStage::PolicyValidation,
                    details: RejectionDetails::Policy(verdict),
                });
            }
            Err(e) => {
                warn!(decision = %decision_id, winner = %winner.id, code = e.code(), error = %e, "policy authority unavailable");
                return Ok(HandoffOutcome::Rejected {
                    stage: HandoffStage::PolicyValidation,
                    details: RejectionDetails::Error {
                        code: e.code().to_string(),
                        message: e.to_string(),
                    },
                });
            }
        };

        let patch = PatchBrief {
            decision_id: decision_id.clone(),
            candidate_id: winner.id.clone(),
            spec: winner.spec.clone(),
            provenance: winner.provenance.clone(),
            rollback: winner.rollback.clone(),
            obligations: winner.obligations.clone(),
            artifact: winner.artifact.clone(),
        };
        let patch_json = serde_json::to_value(&patch).unwrap_or(Value::Null);
        let ticket = self.codegen.submit(patch).await?;

        let capsule = build_capsule(
            brief,
            decision_id,
            winner,
            auction,
            &proof,
            &verdict,
            &ticket,
            patch_json,
            context,
        );
        let capsule_id = self.ledger.put(capsule).await?;

        info!(
            decision = %decision_id,
            winner = %winner.id,
            ticket = %ticket.ticket_id,
            capsule = %capsule_id,
            "winner handed off"
        );
        Ok(HandoffOutcome::Delivered(HandoffReceipt {
            ok: true,
            decision_id: decision_id.clone(),
            winner_id: winner.id.clone(),
            ticket,
            capsule_id,
        }))
    }
}

#[allow(clippy::too_many_arguments)]
fn build_capsule(
    brief: &Brief,
    decision_id: &DecisionId,
    winner: &Candidate,
    auction: &AuctionResult,
    proof: &ProofResult,
    verdict: &PolicyVerdict,
    ticket: &CodegenTicket,
    patch: Value,
    context: CapsuleContext,
) -> DesignCapsule {
    let winner_json = serde_json::to_value(winner).unwrap_or(Value::Null);
    let receipt_json = serde_json::to_value(&auction.market_receipt).unwrap_or(Value::Null);

    let mut capsule = DesignCapsule::new(decision_id.clone(), brief.clone())
        .with_playbook_dag(context.playbook_dag)
        .with_artifact("winner", winner_json)
        .with_artifact("patch_brief", patch)
        .with_artifact("market_receipt", receipt_json)
        .with_eval_log(json!({
            "stage": HandoffStage::ProofValidation.as_str(),
            "candidate_id": winner.id,
            "result": proof,
        }))
        .with_eval_log(json!({
            "stage": HandoffStage::PolicyValidation.as_str(),
            "candidate_id": winner.id,
            "result": verdict,
        }))
        .with_eval_log(json!({
            "stage": "codegen_submission",
            "ticket": ticket,
        }));

    for entry in auction
        .market_receipt
        .ranked
        .iter()
        .filter(|e| e.candidate_id != winner.id)
    {
        capsule = capsule.with_counterfactual(json!({
            "candidate_id": entry.candidate_id,
            "playbook": entry.playbook,
            "value": entry.value,
            "selected": auction.is_winner(&entry.candidate_id),
        }));
    }

    capsule.cost_breakdown = context.cost_breakdown;
    capsule
        .cost_breakdown
        .insert("auction_spend_ms".into(), auction.spend_ms);
    capsule.env = context.env;
    capsule
}
