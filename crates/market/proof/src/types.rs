use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A contract violation found by the verifier.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Violation {
    PreObligationsMissing,
    PostObligationsMissing,
    UnknownRateLimit(String),
    TestsMissingOrFailing,
    /// A post key required by the brief is absent from the candidate.
    PostKeyMissing(String),
    RollbackTypeMissing,
    RollbackParamsMissing,
    /// Evidence has none of `tests`, `invariants`, `attestations`.
    PostEvidenceMissing,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PreObligationsMissing => f.write_str("obligation.pre.missing"),
            Self::PostObligationsMissing => f.write_str("obligation.post.missing"),
            Self::UnknownRateLimit(key) => write!(f, "rate_limits.unknown:{}", key),
            Self::TestsMissingOrFailing => f.write_str("evidence.tests.missing_or_fail"),
            Self::PostKeyMissing(key) => write!(f, "obligation.post.missing:{}", key),
            Self::RollbackTypeMissing => f.write_str("rollback.type.missing"),
            Self::RollbackParamsMissing => f.write_str("rollback.params.missing"),
            Self::PostEvidenceMissing => f.write_str("evidence.post_keys.missing"),
        }
    }
}

/// Result of a proof check. `ok` iff `violations` is empty.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofResult {
    pub ok: bool,
    /// Number of individual checks performed, per check family.
    pub checks: BTreeMap<String, u32>,
    /// Violation codes in detection order.
    pub violations: Vec<String>,
}

impl ProofResult {
    pub fn new(checks: BTreeMap<String, u32>, violations: Vec<Violation>) -> Self {
        let violations: Vec<String> = violations.iter().map(ToString::to_string).collect();
        Self {
            ok: violations.is_empty(),
            checks,
            violations,
        }
    }

    pub fn has_violation(&self, code: &str) -> bool {
        self.violations.iter().any(|v| v == code)
    }

    pub fn total_checks(&self) -> u32 {
        self.checks.values().sum()
    }
}
