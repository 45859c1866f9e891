use crate::error::MechanismError;
use market_types::MechanismGraph;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// A single lint finding.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LintIssue {
    /// The graph has no nodes.
    EmptyGraph,
    /// Edge at `index` is not a `[from, to]` pair.
    EdgeArity { index: usize },
    /// Edge at `index` references a node outside `[0, n)`.
    EdgeOutOfRange { index: usize },
    /// The graph contains a cycle.
    Cycle,
    /// No node is named `critique`.
    MissingCritique,
    /// A `critique` node has no edge into a `repair` node.
    MissingRepair,
}

impl LintIssue {
    /// Machine-readable code, without positional detail.
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyGraph => "mechanism.graph.empty",
            Self::EdgeArity { .. } => "mechanism.edge.arity",
            Self::EdgeOutOfRange { .. } => "mechanism.edge.out_of_range",
            Self::Cycle => "mechanism.graph.cycle",
            Self::MissingCritique => "mechanism.critique.missing",
            Self::MissingRepair => "mechanism.repair.missing",
        }
    }

    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::MissingCritique | Self::MissingRepair)
    }
}

impl fmt::Display for LintIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EdgeArity { index } | Self::EdgeOutOfRange { index } => {
                write!(f, "{}:{}", self.code(), index)
            }
            _ => f.write_str(self.code()),
        }
    }
}

/// Outcome of linting a mechanism graph.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LintReport {
    pub failures: Vec<LintIssue>,
    pub warnings: Vec<LintIssue>,
}

impl LintReport {
    /// No hard failures (warnings allowed).
    pub fn is_valid(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn has_failure(&self, code: &str) -> bool {
        self.failures.iter().any(|i| i.code() == code)
    }

    pub fn has_warning(&self, code: &str) -> bool {
        self.warnings.iter().any(|i| i.code() == code)
    }

    /// Rendered failure codes, in detection order.
    pub fn failure_codes(&self) -> Vec<String> {
        self.failures.iter().map(ToString::to_string).collect()
    }
}

/// Lint a mechanism graph. Never mutates its input.
pub fn lint(graph: &MechanismGraph) -> LintReport {
    let mut report = LintReport::default();
    let n = graph.node_count();

    if n == 0 {
        report.failures.push(LintIssue::EmptyGraph);
    }

    let mut edges_well_formed = true;
    for (index, edge) in graph.edges.iter().enumerate() {
        if edge.endpoints().is_none() {
            report.failures.push(LintIssue::EdgeArity { index });
            edges_well_formed = false;
        } else if edge.indices(n).is_none() {
            report.failures.push(LintIssue::EdgeOutOfRange { index });
            edges_well_formed = false;
        }
    }

    if n > 0 && edges_well_formed && kahn_order(graph).len() < n {
        report.failures.push(LintIssue::Cycle);
    }

    if !graph.has_op("critique") {
        report.warnings.push(LintIssue::MissingCritique);
    } else if !graph.has_named_edge("critique", "repair") {
        report.warnings.push(LintIssue::MissingRepair);
    }

    report
}

/// Topological order of a lint-valid graph.
pub fn topological_order(graph: &MechanismGraph) -> Result<Vec<usize>, MechanismError> {
    let report = lint(graph);
    if !report.is_valid() {
        return Err(MechanismError::InvalidGraph(report.failure_codes()));
    }
    Ok(kahn_order(graph))
}

/// Kahn's algorithm over in-range edges. Nodes on a cycle are never emitted.
fn kahn_order(graph: &MechanismGraph) -> Vec<usize> {
    let n = graph.node_count();
    let mut indegree = vec![0usize; n];
    let mut adjacency: Vec<Vec<usize>> = vec![Vec::new(); n];
    for (from, to) in graph.edges.iter().filter_map(|e| e.indices(n)) {
        adjacency[from].push(to);
        indegree[to] += 1;
    }

    let mut queue: VecDeque<usize> = (0..n).filter(|&i| indegree[i] == 0).collect();
    let mut order = Vec::with_capacity(n);
    while let Some(node) = queue.pop_front() {
        order.push(node);
        for &next in &adjacency[node] {
            indegree[next] -= 1;
            if indegree[next] == 0 {
                queue.push_back(next);
            }
        }
    }
    order
}
