//! Playbooks: named candidate-generation strategies.

use crate::error::PlaybookError;
use async_trait::async_trait;
use market_types::{
    Brief, CapabilitySpec, Candidate, MechanismGraph, Obligations, RollbackContract,
};
use serde_json::{Map, Value};
use std::time::Duration;

/// A candidate generator run as one arm of the portfolio.
#[async_trait]
pub trait Playbook: Send + Sync {
    /// Registry key of this playbook.
    fn name(&self) -> &str;

    /// Produce candidates for `brief` within a soft budget of `budget_ms`.
    async fn run(&self, brief: &Brief, budget_ms: u64) -> Result<Vec<Candidate>, PlaybookError>;
}

/// Default stage list when the brief carries no `pipeline` hint.
pub const DEFAULT_PIPELINE: [&str; 5] = ["analyze", "design", "implement", "critique", "repair"];

/// Deterministic linear-pipeline generator driven by brief hints.
///
/// Recognized hints: `pipeline` (array of stage names), `variants`
/// (number of candidates) and `rate_limits` (object copied into the
/// capability spec).
pub struct TemplatePlaybook {
    name: String,
    variants: usize,
    min_budget_ms: u64,
    evidence: Map<String, Value>,
}

impl TemplatePlaybook {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variants: 1,
            min_budget_ms: 0,
            evidence: Map::new(),
        }
    }

    /// Candidates produced when the brief has no `variants` hint.
    pub fn with_variants(mut self, variants: usize) -> Self {
        self.variants = variants.max(1);
        self
    }

    pub fn with_min_budget_ms(mut self, min_budget_ms: u64) -> Self {
        self.min_budget_ms = min_budget_ms;
        self
    }

    /// Evidence attached to every produced candidate, e.g. results from an
    /// external test harness.
    pub fn with_evidence(mut self, key: impl Into<String>, value: Value) -> Self {
        self.evidence.insert(key.into(), value);
        self
    }

    fn pipeline(brief: &Brief) -> Vec<String> {
        let hinted: Vec<String> = brief
            .hints
            .get("pipeline")
            .and_then(Value::as_array)
            .map(|stages| {
                stages
                    .iter()
                    .filter_map(Value::as_str)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        if hinted.is_empty() {
            DEFAULT_PIPELINE.iter().map(|s| s.to_string()).collect()
        } else {
            hinted
        }
    }

    fn capability(brief: &Brief) -> CapabilitySpec {
        let obligations = brief.obligations.clone().unwrap_or_else(|| Obligations {
            pre: brief.success.pre.clone(),
            post: brief.success.post.clone(),
        });
        let mut params = Map::new();
        params.insert("brief_id".into(), Value::from(brief.id.clone()));

        let mut capability = CapabilitySpec::new();
        if let Some(limits) = brief.hints.get("rate_limits").and_then(Value::as_object) {
            for (k, v) in limits {
                capability = capability.with_rate_limit(k.clone(), v.clone());
            }
        }
        capability.obligations = obligations;
        capability.rollback = RollbackContract::new("revert", params);
        capability
    }
}

#[async_trait]
impl Playbook for TemplatePlaybook {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, brief: &Brief, budget_ms: u64) -> Result<Vec<Candidate>, PlaybookError> {
        if budget_ms < self.min_budget_ms {
            return Err(PlaybookError::BudgetTooSmall(budget_ms));
        }
        let stages = Self::pipeline(brief);
        let variants = brief
            .hints
            .get("variants")
            .and_then(Value::as_u64)
            .map(|v| v.max(1) as usize)
            .unwrap_or(self.variants);
        let capability = Self::capability(brief);

        let candidates = (0..variants)
            .map(|i| {
                let mut graph = MechanismGraph::linear(stages.iter().cloned());
                if let Some(first) = graph.nodes.first_mut() {
                    first.params.insert("variant".into(), Value::from(i as u64));
                }
                let mut candidate = Candidate::new(
                    format!("{}-{}-{}", self.name, brief.id, i),
                    self.name.clone(),
                    graph,
                )
                .with_capability(capability.clone())
                .with_artifact(serde_json::json!({
                    "kind": "template",
                    "stages": stages,
                    "variant": i,
                }));
                for (k, v) in &self.evidence {
                    candidate.evidence.insert_if_absent(k.clone(), v.clone());
                }
                candidate
            })
            .collect();
        Ok(candidates)
    }
}

/// Returns preset candidates, optionally after a delay or with a fixed error.
pub struct StaticPlaybook {
    name: String,
    candidates: Vec<Candidate>,
    failure: Option<PlaybookError>,
    delay: Option<Duration>,
}

impl StaticPlaybook {
    pub fn new(name: impl Into<String>, candidates: Vec<Candidate>) -> Self {
        Self {
            name: name.into(),
            candidates,
            failure: None,
            delay: None,
        }
    }

    /// A playbook that always fails with `error`.
    pub fn failing(name: impl Into<String>, error: PlaybookError) -> Self {
        Self {
            name: name.into(),
            candidates: Vec::new(),
            failure: Some(error),
            delay: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl Playbook for StaticPlaybook {
    fn name(&self) -> &str {
        &self.name
    }

    async fn run(&self, _brief: &Brief, _budget_ms: u64) -> Result<Vec<Candidate>, PlaybookError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.failure {
            Some(e) => Err(e.clone()),
            None => Ok(self.candidates.clone()),
        }
    }
}
