use market_types::MechanismGraph;
use serde::{Deserialize, Serialize};

/// Clamp to `[0, 1]`. NaN maps to 0.
pub fn clamp01(x: f64) -> f64 {
    if x.is_nan() {
        0.0
    } else {
        x.clamp(0.0, 1.0)
    }
}

/// Heuristic scores derived from graph shape alone.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Estimates {
    pub complexity: f64,
    pub risk: f64,
    pub fae: f64,
    pub cost_ms: f64,
}

/// Estimate scores for a mechanism graph.
///
/// `fae` is computed from the estimated complexity and risk; callers that
/// keep a playbook-supplied complexity or risk should recompute it with
/// [`Estimates::fae_from`].
pub fn estimate(graph: &MechanismGraph) -> Estimates {
    let nodes = graph.node_count() as f64;
    let edges = graph.edge_count() as f64;

    let complexity = clamp01((nodes + 0.5 * edges) / 20.0);
    let risk = clamp01(0.2 + 0.6 * (edges / nodes.max(1.0)));
    let density = edges / (nodes - 1.0).max(1.0);
    let cost_ms = 5.0 * nodes + 2.0 * edges + 10.0 * density * density;

    Estimates {
        complexity,
        risk,
        fae: Estimates::fae_from(complexity, risk),
        cost_ms,
    }
}

impl Estimates {
    pub fn fae_from(complexity: f64, risk: f64) -> f64 {
        clamp01(0.65 * complexity + 0.35 * (1.0 - risk))
    }
}
