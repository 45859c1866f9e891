//! Policy authority contract.

use async_trait::async_trait;
use market_types::{CapabilitySpec, DecisionId, Obligations};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// What the policy authority is asked to approve.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PolicyRequest {
    pub decision_id: DecisionId,
    pub candidate_id: String,
    pub capability_spec: CapabilitySpec,
    pub obligations: Obligations,
    #[serde(default)]
    pub identity_context: Map<String, Value>,
}

/// The authority's answer.
///
/// On the wire this is `{ok, reason?}`; `reasons` carries the individual
/// findings when the authority reports more than one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "VerdictWire", into = "VerdictWire")]
pub struct PolicyVerdict {
    pub allowed: bool,
    pub reasons: Vec<String>,
}

#[derive(Serialize, Deserialize)]
struct VerdictWire {
    ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    reasons: Vec<String>,
}

impl From<VerdictWire> for PolicyVerdict {
    fn from(wire: VerdictWire) -> Self {
        let mut reasons = wire.reasons;
        if reasons.is_empty() {
            reasons.extend(wire.reason);
        }
        Self {
            allowed: wire.ok,
            reasons,
        }
    }
}

impl From<PolicyVerdict> for VerdictWire {
    fn from(verdict: PolicyVerdict) -> Self {
        Self {
            ok: verdict.allowed,
            reason: verdict.reason(),
            reasons: verdict.reasons,
        }
    }
}

impl PolicyVerdict {
    /// All reasons joined with `; `, if any.
    pub fn reason(&self) -> Option<String> {
        if self.reasons.is_empty() {
            None
        } else {
            Some(self.reasons.join("; "))
        }
    }

    pub fn allow() -> Self {
        Self {
            allowed: true,
            reasons: Vec::new(),
        }
    }

    pub fn deny<I, S>(reasons: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed: false,
            reasons: reasons.into_iter().map(Into::into).collect(),
        }
    }
}

/// Failure to obtain a verdict.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PolicyError {
    #[error("policy authority unreachable: {0}")]
    Unreachable(String),
    #[error("policy request malformed: {0}")]
    Malformed(String),
}

impl PolicyError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unreachable(_) => "policy.unreachable",
            Self::Malformed(_) => "policy.malformed",
        }
    }
}

/// External identity/policy authority.
#[async_trait]
pub trait PolicyAuthority: Send + Sync {
    async fn validate(&self, request: &PolicyRequest) -> Result<PolicyVerdict, PolicyError>;
}

/// Approves everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct AllowAllPolicy;

#[async_trait]
impl PolicyAuthority for AllowAllPolicy {
    async fn validate(&self, _request: &PolicyRequest) -> Result<PolicyVerdict, PolicyError> {
        Ok(PolicyVerdict::allow())
    }
}

/// Rule-based authority for hosts and tests.
///
/// Denies capabilities declaring any deny-listed rate-limit key and
/// requests missing a required identity key. A fixed response, when set,
/// overrides the rules.
#[derive(Clone, Debug, Default)]
pub struct StaticPolicy {
    denied_rate_limit_keys: Vec<String>,
    required_identity_keys: Vec<String>,
    fixed: Option<Result<PolicyVerdict, PolicyError>>,
}

impl StaticPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deny_rate_limit_key(mut self, key: impl Into<String>) -> Self {
        self.denied_rate_limit_keys.push(key.into());
        self
    }

    pub fn require_identity_key(mut self, key: impl Into<String>) -> Self {
        self.required_identity_keys.push(key.into());
        self
    }

    pub fn fixed(verdict: PolicyVerdict) -> Self {
        Self {
            fixed: Some(Ok(verdict)),
            ..Self::default()
        }
    }

    pub fn unreachable(reason: impl Into<String>) -> Self {
        Self {
            fixed: Some(Err(PolicyError::Unreachable(reason.into()))),
            ..Self::default()
        }
    }
}

#[async_trait]
impl PolicyAuthority for StaticPolicy {
    async fn validate(&self, request: &PolicyRequest) -> Result<PolicyVerdict, PolicyError> {
        if let Some(fixed) = &self.fixed {
            return fixed.clone();
        }
        let mut reasons = Vec::new();
        for key in &self.denied_rate_limit_keys {
            if request.capability_spec.rate_limits.contains_key(key) {
                reasons.push(format!("rate_limits.denied:{}", key));
            }
        }
        for key in &self.required_identity_keys {
            if !request.identity_context.contains_key(key) {
                reasons.push(format!("identity.missing:{}", key));
            }
        }
        if reasons.is_empty() {
            Ok(PolicyVerdict::allow())
        } else {
            Ok(PolicyVerdict::deny(reasons))
        }
    }
}
