use crate::error::RankError;
use async_trait::async_trait;
use market_types::{Brief, DecisionId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// What a ranker sees about the task at hand.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TaskContext {
    pub decision_id: DecisionId,
    pub brief_id: String,
    pub problem: String,
    #[serde(default)]
    pub context: Map<String, Value>,
    #[serde(default)]
    pub hints: Map<String, Value>,
}

impl TaskContext {
    pub fn from_brief(brief: &Brief, decision_id: &DecisionId) -> Self {
        Self {
            decision_id: decision_id.clone(),
            brief_id: brief.id.clone(),
            problem: brief.problem.clone(),
            context: brief.context.clone(),
            hints: brief.hints.clone(),
        }
    }
}

/// Orders candidate arms, champion first.
#[async_trait]
pub trait ArmRanker: Send + Sync {
    async fn rank(&self, task: &TaskContext, arms: &[String]) -> Result<Vec<String>, RankError>;
}

/// Keeps registry order.
#[derive(Clone, Copy, Debug, Default)]
pub struct RegistryOrderRanker;

#[async_trait]
impl ArmRanker for RegistryOrderRanker {
    async fn rank(&self, _task: &TaskContext, arms: &[String]) -> Result<Vec<String>, RankError> {
        Ok(arms.to_vec())
    }
}

/// Returns a fixed preference list.
#[derive(Clone, Debug, Default)]
pub struct FixedRanker {
    order: Vec<String>,
}

impl FixedRanker {
    pub fn new<I, S>(order: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            order: order.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl ArmRanker for FixedRanker {
    async fn rank(&self, _task: &TaskContext, _arms: &[String]) -> Result<Vec<String>, RankError> {
        Ok(self.order.clone())
    }
}

/// Reconcile ranker output with the registry.
///
/// Unknown and repeated names are dropped; an error or an empty result
/// falls back to registry order.
pub fn resolve_ranking(
    ranked: Result<Vec<String>, RankError>,
    registry_order: &[String],
) -> Vec<String> {
    let ranked = match ranked {
        Ok(names) => names,
        Err(e) => {
            tracing::warn!(code = e.code(), error = %e, "arm ranker failed, using registry order");
            return registry_order.to_vec();
        }
    };
    let mut resolved: Vec<String> = Vec::with_capacity(ranked.len());
    for name in ranked {
        if registry_order.contains(&name) && !resolved.contains(&name) {
            resolved.push(name);
        }
    }
    if resolved.is_empty() {
        tracing::debug!("ranker output unusable, using registry order");
        registry_order.to_vec()
    } else {
        resolved
    }
}
