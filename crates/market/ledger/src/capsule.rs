use chrono::{DateTime, Utc};
use market_types::{Brief, CapsuleId, ContentHash, DecisionId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Durable provenance record for one handed-off winner.
///
/// Written once; afterwards only new annotation keys may be added.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DesignCapsule {
    pub capsule_id: CapsuleId,
    pub decision_id: DecisionId,
    pub created_at: DateTime<Utc>,
    pub brief: Brief,
    /// Arms, their order and allocations for the run that produced the winner.
    #[serde(default)]
    pub playbook_dag: Value,
    #[serde(default)]
    pub artifacts: BTreeMap<String, Value>,
    #[serde(default)]
    pub eval_logs: Vec<Value>,
    /// Ranked runners-up that were not selected.
    #[serde(default)]
    pub counterfactuals: Vec<Value>,
    #[serde(default)]
    pub cost_breakdown: BTreeMap<String, f64>,
    /// BLAKE3 barcode per artifact name.
    #[serde(default)]
    pub barcodes: BTreeMap<String, ContentHash>,
    /// Environment pins and seeds.
    #[serde(default)]
    pub env: BTreeMap<String, Value>,
    #[serde(default)]
    pub annotations: BTreeMap<String, Value>,
}

impl DesignCapsule {
    pub fn new(decision_id: DecisionId, brief: Brief) -> Self {
        Self {
            capsule_id: CapsuleId::new(),
            decision_id,
            created_at: Utc::now(),
            brief,
            playbook_dag: Value::Null,
            artifacts: BTreeMap::new(),
            eval_logs: Vec::new(),
            counterfactuals: Vec::new(),
            cost_breakdown: BTreeMap::new(),
            barcodes: BTreeMap::new(),
            env: BTreeMap::new(),
            annotations: BTreeMap::new(),
        }
    }

    /// Well-formed capsule with no content, returned for unknown ids.
    pub fn empty(capsule_id: CapsuleId) -> Self {
        Self {
            capsule_id,
            decision_id: DecisionId(String::new()),
            created_at: DateTime::<Utc>::default(),
            ..Self::new(DecisionId(String::new()), Brief::default())
        }
    }

    pub fn is_empty(&self) -> bool {
        self.decision_id.as_str().is_empty() && self.artifacts.is_empty()
    }

    pub fn with_playbook_dag(mut self, dag: Value) -> Self {
        self.playbook_dag = dag;
        self
    }

    /// Add an artifact and record its content barcode.
    pub fn with_artifact(mut self, name: impl Into<String>, artifact: Value) -> Self {
        let name = name.into();
        let barcode = barcode(&artifact);
        self.barcodes.insert(name.clone(), barcode);
        self.artifacts.insert(name, artifact);
        self
    }

    pub fn with_eval_log(mut self, entry: Value) -> Self {
        self.eval_logs.push(entry);
        self
    }

    pub fn with_counterfactual(mut self, entry: Value) -> Self {
        self.counterfactuals.push(entry);
        self
    }

    pub fn with_cost(mut self, key: impl Into<String>, ms: f64) -> Self {
        self.cost_breakdown.insert(key.into(), ms);
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Recompute every artifact barcode and compare.
    pub fn verify_barcodes(&self) -> bool {
        self.artifacts.len() == self.barcodes.len()
            && self
                .artifacts
                .iter()
                .all(|(name, artifact)| self.barcodes.get(name) == Some(&barcode(artifact)))
    }
}

fn barcode(artifact: &Value) -> ContentHash {
    // A JSON value always re-serializes.
    ContentHash::of_json(artifact).unwrap_or_else(|_| ContentHash::zero())
}
