use crate::estimators::{clamp01, estimate, Estimates};
use market_proof::{ContractVerifier, ProofVerifier};
use market_types::Candidate;
use serde_json::json;
use tracing::{debug, warn};

/// Evidence key holding the base PCC result.
pub const PCC_EVIDENCE_KEY: &str = "pcc";

/// Fill-if-absent annotator run over every candidate before the auction.
pub struct EvaluationAnnotator<V = ProofVerifier> {
    verifier: V,
}

impl EvaluationAnnotator<ProofVerifier> {
    pub fn new() -> Self {
        Self {
            verifier: ProofVerifier,
        }
    }
}

impl Default for EvaluationAnnotator<ProofVerifier> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: ContractVerifier> EvaluationAnnotator<V> {
    pub fn with_verifier(verifier: V) -> Self {
        Self { verifier }
    }

    pub fn verifier(&self) -> &V {
        &self.verifier
    }

    /// Annotate one candidate in place.
    pub fn annotate(&self, candidate: &mut Candidate) {
        let pcc = match self.verifier.check_candidate(candidate) {
            Ok(result) => json!({"ok": result.ok, "violations": result.violations}),
            Err(e) => {
                warn!(candidate = %candidate.id, code = e.code(), error = %e, "pcc check failed");
                json!({"ok": false, "error": e.to_string()})
            }
        };
        candidate.evidence.insert_if_absent(PCC_EVIDENCE_KEY, pcc);

        let est: Estimates = estimate(candidate.mechanism());
        let scores = &mut candidate.scores;
        let complexity = *scores.complexity.get_or_insert(est.complexity);
        let risk = *scores.risk.get_or_insert(est.risk);
        scores
            .fae
            .get_or_insert_with(|| Estimates::fae_from(clamp01(complexity), clamp01(risk)));
        scores.cost_ms.get_or_insert(est.cost_ms);

        debug!(
            candidate = %candidate.id,
            fae = ?candidate.scores.fae,
            risk = ?candidate.scores.risk,
            "candidate annotated"
        );
    }

    /// Annotate every candidate. Order and membership are preserved.
    pub fn annotate_all(&self, mut candidates: Vec<Candidate>) -> Vec<Candidate> {
        candidates.iter_mut().for_each(|c| self.annotate(c));
        candidates
    }
}
