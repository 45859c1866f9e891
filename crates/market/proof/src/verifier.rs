use crate::error::ProofError;
use crate::types::{ProofResult, Violation};
use market_types::{
    CapabilitySpec, Candidate, Evidence, Obligations, RollbackContract, SuccessCriteria,
};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Evidence keys that satisfy the post-condition evidence requirement.
pub const POST_EVIDENCE_KEYS: [&str; 3] = ["tests", "invariants", "attestations"];

/// Proof-carrying-code contract verifier.
///
/// `check` is the base contract; `check_extended` adds the brief-driven
/// superset, rollback and post-evidence requirements used to gate promotion.
pub trait ContractVerifier: Send + Sync {
    fn check(
        &self,
        capability: &CapabilitySpec,
        obligations: &Obligations,
        evidence: Option<&Evidence>,
    ) -> Result<ProofResult, ProofError>;

    fn check_extended(
        &self,
        capability: &CapabilitySpec,
        obligations: &Obligations,
        rollback: &RollbackContract,
        evidence: Option<&Evidence>,
        success: &SuccessCriteria,
    ) -> Result<ProofResult, ProofError>;

    /// Base check against a candidate's own contract and evidence.
    fn check_candidate(&self, candidate: &Candidate) -> Result<ProofResult, ProofError> {
        self.check(
            candidate.capability(),
            &candidate.obligations,
            supplied(&candidate.evidence),
        )
    }

    /// Extended check of a candidate against a brief's success criteria.
    fn check_candidate_extended(
        &self,
        candidate: &Candidate,
        success: &SuccessCriteria,
    ) -> Result<ProofResult, ProofError> {
        self.check_extended(
            candidate.capability(),
            &candidate.obligations,
            &candidate.rollback,
            supplied(&candidate.evidence),
            success,
        )
    }
}

impl<T: ContractVerifier + ?Sized> ContractVerifier for Arc<T> {
    fn check(
        &self,
        capability: &CapabilitySpec,
        obligations: &Obligations,
        evidence: Option<&Evidence>,
    ) -> Result<ProofResult, ProofError> {
        (**self).check(capability, obligations, evidence)
    }

    fn check_extended(
        &self,
        capability: &CapabilitySpec,
        obligations: &Obligations,
        rollback: &RollbackContract,
        evidence: Option<&Evidence>,
        success: &SuccessCriteria,
    ) -> Result<ProofResult, ProofError> {
        (**self).check_extended(capability, obligations, rollback, evidence, success)
    }
}

/// Empty evidence counts as not supplied.
fn supplied(evidence: &Evidence) -> Option<&Evidence> {
    if evidence.is_empty() {
        None
    } else {
        Some(evidence)
    }
}

/// The built-in, stateless verifier.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProofVerifier;

impl ProofVerifier {
    pub fn new() -> Self {
        Self
    }

    fn base(
        capability: &CapabilitySpec,
        obligations: &Obligations,
        evidence: Option<&Evidence>,
        checks: &mut BTreeMap<String, u32>,
        violations: &mut Vec<Violation>,
    ) {
        *checks.entry("obligations".into()).or_default() += 2;
        if obligations.pre.is_empty() {
            violations.push(Violation::PreObligationsMissing);
        }
        if obligations.post.is_empty() {
            violations.push(Violation::PostObligationsMissing);
        }

        *checks.entry("rate_limits".into()).or_default() += capability.rate_limits.len() as u32;
        for key in capability.unknown_rate_limit_keys() {
            violations.push(Violation::UnknownRateLimit(key.to_string()));
        }

        if let Some(evidence) = evidence {
            *checks.entry("evidence".into()).or_default() += 1;
            if !evidence.tests_ok() {
                violations.push(Violation::TestsMissingOrFailing);
            }
        }
    }
}

impl ContractVerifier for ProofVerifier {
    fn check(
        &self,
        capability: &CapabilitySpec,
        obligations: &Obligations,
        evidence: Option<&Evidence>,
    ) -> Result<ProofResult, ProofError> {
        let mut checks = BTreeMap::new();
        let mut violations = Vec::new();
        Self::base(capability, obligations, evidence, &mut checks, &mut violations);
        Ok(ProofResult::new(checks, violations))
    }

    fn check_extended(
        &self,
        capability: &CapabilitySpec,
        obligations: &Obligations,
        rollback: &RollbackContract,
        evidence: Option<&Evidence>,
        success: &SuccessCriteria,
    ) -> Result<ProofResult, ProofError> {
        let mut checks = BTreeMap::new();
        let mut violations = Vec::new();
        Self::base(capability, obligations, evidence, &mut checks, &mut violations);

        *checks.entry("post_superset".into()).or_default() += success.post.len() as u32;
        for key in &success.post {
            if !obligations.post.contains(key) {
                violations.push(Violation::PostKeyMissing(key.clone()));
            }
        }

        *checks.entry("rollback".into()).or_default() += 2;
        if !rollback.has_type() {
            violations.push(Violation::RollbackTypeMissing);
        }
        if !rollback.has_params() {
            violations.push(Violation::RollbackParamsMissing);
        }

        *checks.entry("post_evidence".into()).or_default() += 1;
        let has_post_evidence = evidence
            .is_some_and(|e| POST_EVIDENCE_KEYS.iter().any(|k| e.contains_key(k)));
        if !has_post_evidence {
            violations.push(Violation::PostEvidenceMissing);
        }

        Ok(ProofResult::new(checks, violations))
    }
}
