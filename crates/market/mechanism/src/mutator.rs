use crate::validator::lint;
use market_types::{Candidate, Evidence, MechanismGraph, Op, Scores};
use serde_json::{Number, Value};
use tracing::debug;

/// Default relative jitter applied to numeric parameters.
pub const DEFAULT_JITTER_PCT: f64 = 0.10;

/// Novelty assigned to mutated variants before evaluation.
pub const MUTATION_NOVELTY: f64 = 0.3;

/// Lint-safe structural mutator.
///
/// Jitter direction is a pure function of the parameter value, the jitter
/// percentage and the optional seed, so identical inputs always produce
/// identical variants.
#[derive(Clone, Debug)]
pub struct Mutator {
    jitter_pct: f64,
    seed: Option<u64>,
}

impl Mutator {
    pub fn new() -> Self {
        Self {
            jitter_pct: DEFAULT_JITTER_PCT,
            seed: None,
        }
    }

    pub fn with_jitter_pct(mut self, pct: f64) -> Self {
        self.jitter_pct = pct.abs();
        self
    }

    /// Salt the jitter direction so equal values can diverge across runs.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Scale `value` up or down by the jitter percentage.
    pub fn jitter(&self, value: f64) -> f64 {
        if self.jitter_up(value) {
            value * (1.0 + self.jitter_pct)
        } else {
            value * (1.0 - self.jitter_pct)
        }
    }

    fn jitter_up(&self, value: f64) -> bool {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&value.to_bits().to_le_bytes());
        hasher.update(&self.jitter_pct.to_bits().to_le_bytes());
        if let Some(seed) = self.seed {
            hasher.update(&seed.to_le_bytes());
        }
        hasher.finalize().as_bytes()[0] & 1 == 0
    }

    fn jitter_in_place(&self, value: &mut Value) {
        match value {
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    *value = Value::from(self.jitter(i as f64).round() as i64);
                } else if let Some(u) = n.as_u64() {
                    *value = Value::from(self.jitter(u as f64).round() as u64);
                } else if let Some(jittered) = n.as_f64().and_then(|f| Number::from_f64(self.jitter(f))) {
                    *value = Value::Number(jittered);
                }
            }
            Value::Array(items) => items.iter_mut().for_each(|v| self.jitter_in_place(v)),
            Value::Object(map) => map.values_mut().for_each(|v| self.jitter_in_place(v)),
            _ => {}
        }
    }

    /// Produce a mutated copy of `graph`, or `None` if the result fails lint.
    pub fn mutate(&self, graph: &MechanismGraph) -> Option<MechanismGraph> {
        let mut next = graph.clone();

        for op in &mut next.nodes {
            op.params.values_mut().for_each(|v| self.jitter_in_place(v));
        }

        if !next.has_op("batch") {
            let batch = next.nodes.len();
            next.nodes.push(Op::new("batch"));
            next = next.with_edge(0, batch);
        }

        if !next.has_named_edge("critique", "repair") {
            let last = next.nodes.len() - 1;
            let critique = next.nodes.len();
            next = next
                .with_op(Op::new("critique"))
                .with_op(Op::new("repair"))
                .with_edge(last, critique)
                .with_edge(critique, critique + 1);
        }

        let report = lint(&next);
        if !report.is_valid() {
            debug!(failures = ?report.failure_codes(), "mutated graph discarded");
            return None;
        }
        Some(next)
    }

    /// Candidate-level mutation.
    ///
    /// The variant keeps the source's artifact, capability, obligations,
    /// rollback and evidence; its scores are reset to a conservative novelty
    /// so the annotator re-estimates the rest.
    pub fn augment(&self, candidate: &Candidate) -> Option<Candidate> {
        let mechanism = self.mutate(candidate.mechanism())?;
        let mut variant = candidate.clone();
        variant.id = format!("{}~mut", candidate.id);
        variant.spec.mechanism = mechanism;
        variant.scores = Scores {
            novelty: Some(MUTATION_NOVELTY),
            ..Scores::default()
        };
        variant.evidence = candidate
            .evidence
            .keys()
            .filter(|k| *k != "pcc")
            .filter_map(|k| candidate.evidence.get(k).map(|v| (k.to_string(), v.clone())))
            .collect::<Evidence>();
        variant.provenance.mutated_from = Some(candidate.id.clone());
        variant.provenance.mutation_lineage.push(candidate.id.clone());
        Some(variant)
    }
}

impl Default for Mutator {
    fn default() -> Self {
        Self::new()
    }
}
