use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Rate-limit keys a capability spec may declare.
pub const RATE_LIMIT_KEYS: [&str; 3] = ["qps", "burst", "concurrency"];

/// Pre/post obligation keys carried by a candidate.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Obligations {
    #[serde(default)]
    pub pre: Vec<String>,
    #[serde(default)]
    pub post: Vec<String>,
}

impl Obligations {
    pub fn new<I, J, S, T>(pre: I, post: J) -> Self
    where
        I: IntoIterator<Item = S>,
        J: IntoIterator<Item = T>,
        S: Into<String>,
        T: Into<String>,
    {
        Self {
            pre: pre.into_iter().map(Into::into).collect(),
            post: post.into_iter().map(Into::into).collect(),
        }
    }
}

/// How a deployed change is undone.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RollbackContract {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Map<String, Value>>,
}

impl RollbackContract {
    pub fn new(kind: impl Into<String>, params: Map<String, Value>) -> Self {
        Self {
            kind: Some(kind.into()),
            params: Some(params),
        }
    }

    pub fn has_type(&self) -> bool {
        self.kind.as_deref().is_some_and(|k| !k.trim().is_empty())
    }

    /// Params are present when declared, even if empty.
    pub fn has_params(&self) -> bool {
        self.params.is_some()
    }
}

/// Interface contract of a candidate capability.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CapabilitySpec {
    #[serde(default)]
    pub io_schema: Map<String, Value>,
    #[serde(default)]
    pub rate_limits: BTreeMap<String, Value>,
    #[serde(default)]
    pub obligations: Obligations,
    #[serde(default)]
    pub rollback: RollbackContract,
}

impl CapabilitySpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_io(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.io_schema.insert(key.into(), value.into());
        self
    }

    pub fn with_rate_limit(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.rate_limits.insert(key.into(), value.into());
        self
    }

    /// Rate-limit keys outside [`RATE_LIMIT_KEYS`], in key order.
    pub fn unknown_rate_limit_keys(&self) -> Vec<&str> {
        self.rate_limits
            .keys()
            .map(String::as_str)
            .filter(|k| !RATE_LIMIT_KEYS.contains(k))
            .collect()
    }
}
