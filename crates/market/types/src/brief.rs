use crate::capability::Obligations;
use crate::error::BriefError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Obligation keys a winning candidate must carry.
///
/// `post` is used by the extended proof check as a strict superset
/// requirement on the candidate's post obligations.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SuccessCriteria {
    #[serde(default)]
    pub pre: Vec<String>,
    #[serde(default)]
    pub post: Vec<String>,
}

/// A problem brief submitted to the market.
///
/// Created once by the caller and read-only to the engine.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Brief {
    pub id: String,
    pub problem: String,
    #[serde(default)]
    pub context: Map<String, Value>,
    #[serde(default)]
    pub constraints: Map<String, Value>,
    #[serde(default)]
    pub success: SuccessCriteria,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub obligations: Option<Obligations>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<Value>,
    #[serde(default)]
    pub hints: Map<String, Value>,
}

impl Brief {
    pub fn new(id: impl Into<String>, problem: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            problem: problem.into(),
            ..Default::default()
        }
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    pub fn with_constraint(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.constraints.insert(key.into(), value.into());
        self
    }

    pub fn with_hint(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.hints.insert(key.into(), value.into());
        self
    }

    pub fn with_success_pre<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.success.pre = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_success_post<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.success.post = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_obligations(mut self, obligations: Obligations) -> Self {
        self.obligations = Some(obligations);
        self
    }

    pub fn with_fallback(mut self, fallback: Value) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Reject briefs the engine cannot run.
    pub fn validate(&self) -> Result<(), BriefError> {
        if self.id.trim().is_empty() {
            return Err(BriefError::EmptyId);
        }
        if self.problem.trim().is_empty() {
            return Err(BriefError::EmptyProblem);
        }
        let keys = self.success.pre.iter().chain(self.success.post.iter());
        if keys.into_iter().any(|k| k.trim().is_empty()) {
            return Err(BriefError::EmptySuccessKey);
        }
        Ok(())
    }
}
