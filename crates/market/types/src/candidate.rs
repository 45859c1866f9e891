use crate::capability::{CapabilitySpec, Obligations, RollbackContract};
use crate::mechanism::MechanismGraph;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Scores a candidate carries into the auction.
///
/// Every score is optional: playbooks set what they know and the
/// evaluation annotator fills the rest.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Scores {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fae: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub novelty: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub complexity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost_ms: Option<f64>,
}

/// Proof and test evidence, write-once per key.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Evidence(BTreeMap<String, Value>);

impl Evidence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `value` under `key` unless the key is already present.
    ///
    /// Returns `true` when the value was written.
    pub fn insert_if_absent(&mut self, key: impl Into<String>, value: Value) -> bool {
        let key = key.into();
        if self.0.contains_key(&key) {
            return false;
        }
        self.0.insert(key, value);
        true
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// `tests.ok` is present and exactly `true`.
    pub fn tests_ok(&self) -> bool {
        self.0
            .get("tests")
            .and_then(|t| t.get("ok"))
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

impl FromIterator<(String, Value)> for Evidence {
    fn from_iter<T: IntoIterator<Item = (String, Value)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Where a candidate came from.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portfolio_arm: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decision_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brief_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mutated_from: Option<String>,
    /// Ancestor candidate ids, oldest first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mutation_lineage: Vec<String>,
}

/// Structural payload of a candidate.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CandidateSpec {
    pub mechanism: MechanismGraph,
    #[serde(default)]
    pub capability: CapabilitySpec,
}

/// A proposal produced by a playbook and traded in the auction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    pub playbook: String,
    #[serde(default)]
    pub artifact: Value,
    pub spec: CandidateSpec,
    #[serde(default)]
    pub scores: Scores,
    #[serde(default)]
    pub evidence: Evidence,
    #[serde(default)]
    pub obligations: Obligations,
    #[serde(default)]
    pub rollback: RollbackContract,
    #[serde(default)]
    pub provenance: Provenance,
}

impl Candidate {
    pub fn new(
        id: impl Into<String>,
        playbook: impl Into<String>,
        mechanism: MechanismGraph,
    ) -> Self {
        Self {
            id: id.into(),
            playbook: playbook.into(),
            artifact: Value::Null,
            spec: CandidateSpec {
                mechanism,
                capability: CapabilitySpec::default(),
            },
            scores: Scores::default(),
            evidence: Evidence::default(),
            obligations: Obligations::default(),
            rollback: RollbackContract::default(),
            provenance: Provenance::default(),
        }
    }

    pub fn with_artifact(mut self, artifact: Value) -> Self {
        self.artifact = artifact;
        self
    }

    /// Replace the capability spec, keeping candidate-level obligations and
    /// rollback in sync with it.
    pub fn with_capability(mut self, capability: CapabilitySpec) -> Self {
        self.obligations = capability.obligations.clone();
        self.rollback = capability.rollback.clone();
        self.spec.capability = capability;
        self
    }

    pub fn with_obligations(mut self, obligations: Obligations) -> Self {
        self.spec.capability.obligations = obligations.clone();
        self.obligations = obligations;
        self
    }

    pub fn with_rollback(mut self, rollback: RollbackContract) -> Self {
        self.spec.capability.rollback = rollback.clone();
        self.rollback = rollback;
        self
    }

    pub fn with_evidence(mut self, key: impl Into<String>, value: Value) -> Self {
        self.evidence.insert_if_absent(key, value);
        self
    }

    pub fn with_fae(mut self, fae: f64) -> Self {
        self.scores.fae = Some(fae);
        self
    }

    pub fn with_novelty(mut self, novelty: f64) -> Self {
        self.scores.novelty = Some(novelty);
        self
    }

    pub fn with_risk(mut self, risk: f64) -> Self {
        self.scores.risk = Some(risk);
        self
    }

    pub fn with_cost_ms(mut self, cost_ms: f64) -> Self {
        self.scores.cost_ms = Some(cost_ms);
        self
    }

    pub fn mechanism(&self) -> &MechanismGraph {
        &self.spec.mechanism
    }

    pub fn capability(&self) -> &CapabilitySpec {
        &self.spec.capability
    }
}
