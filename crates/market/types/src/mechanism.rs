use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single operation node in a mechanism graph.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Op {
    pub name: String,
    #[serde(default)]
    pub params: Map<String, Value>,
}

impl Op {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: Map::new(),
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

/// A raw `[from, to]` edge.
///
/// Kept as a list of signed indices so malformed edges (wrong arity,
/// negative or out-of-range indices) survive deserialization and can be
/// reported by lint instead of failing at parse time.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Edge(pub Vec<i64>);

impl Edge {
    pub fn new(from: usize, to: usize) -> Self {
        Self(vec![from as i64, to as i64])
    }

    /// The `(from, to)` pair when the edge has exactly two entries.
    pub fn endpoints(&self) -> Option<(i64, i64)> {
        match self.0.as_slice() {
            [from, to] => Some((*from, *to)),
            _ => None,
        }
    }

    /// In-range `(from, to)` indices for a graph with `n` nodes.
    pub fn indices(&self, n: usize) -> Option<(usize, usize)> {
        let (from, to) = self.endpoints()?;
        let in_range = |i: i64| i >= 0 && (i as u64) < n as u64;
        if in_range(from) && in_range(to) {
            Some((from as usize, to as usize))
        } else {
            None
        }
    }
}

/// DAG-shaped structural description of a candidate's behavior.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MechanismGraph {
    #[serde(default)]
    pub nodes: Vec<Op>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl MechanismGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Linear pipeline `ops[0] -> ops[1] -> ... -> ops[n-1]`.
    pub fn linear<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let nodes: Vec<Op> = names.into_iter().map(Op::new).collect();
        let edges = (1..nodes.len()).map(|i| Edge::new(i - 1, i)).collect();
        Self { nodes, edges }
    }

    pub fn with_op(mut self, op: Op) -> Self {
        self.nodes.push(op);
        self
    }

    pub fn with_edge(mut self, from: usize, to: usize) -> Self {
        self.edges.push(Edge::new(from, to));
        self
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn has_op(&self, name: &str) -> bool {
        self.nodes.iter().any(|op| op.name == name)
    }

    /// True if some node named `from` has a direct edge to a node named `to`.
    pub fn has_named_edge(&self, from: &str, to: &str) -> bool {
        let n = self.nodes.len();
        self.edges.iter().filter_map(|e| e.indices(n)).any(|(a, b)| {
            self.nodes[a].name == from && self.nodes[b].name == to
        })
    }
}
