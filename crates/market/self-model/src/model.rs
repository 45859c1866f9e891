use crate::error::SelfModelError;
use crate::persistence::SelfModelStore;
use crate::types::{problem_signature, ArmKey, ArmOutcome, ArmStats};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;
use tracing::{debug, warn};

/// Floor applied to every arm weight before normalization.
pub const MIN_ARM_WEIGHT: f64 = 1e-6;

/// Tuning for the self-model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SelfModelConfig {
    /// Weight of the exploration (UCB) term; efficiency gets the rest.
    pub ucb_weight: f64,
    /// Half-life applied to persisted counters on load.
    pub half_life_days: f64,
}

impl Default for SelfModelConfig {
    fn default() -> Self {
        Self {
            ucb_weight: 0.15,
            half_life_days: 7.0,
        }
    }
}

/// Decaying per-arm performance memory.
///
/// `update` is the only mutation path and serializes on the write lock;
/// `priors` reads a consistent snapshot under the read lock.
pub struct SelfModel {
    config: SelfModelConfig,
    arms: RwLock<HashMap<ArmKey, ArmStats>>,
}

impl SelfModel {
    pub fn new(config: SelfModelConfig) -> Self {
        Self {
            config,
            arms: RwLock::new(HashMap::new()),
        }
    }

    pub fn from_arms(config: SelfModelConfig, arms: HashMap<ArmKey, ArmStats>) -> Self {
        Self {
            config,
            arms: RwLock::new(arms),
        }
    }

    /// Load from a store, decaying every arm to `now`.
    ///
    /// Missing or unreadable state degrades to an empty model.
    pub fn load(config: SelfModelConfig, store: &dyn SelfModelStore, now: DateTime<Utc>) -> Self {
        let arms = match store.load() {
            Ok(arms) => arms,
            Err(e) => {
                warn!(error = %e, code = e.code(), "self-model state unreadable, starting empty");
                HashMap::new()
            }
        };
        let decayed = arms
            .into_iter()
            .map(|(k, s)| {
                let d = s.decayed(now, config.half_life_days);
                (k, d)
            })
            .collect::<HashMap<_, _>>();
        debug!(arms = decayed.len(), "self-model loaded");
        Self::from_arms(config, decayed)
    }

    /// Persist the current arm table.
    pub fn persist(&self, store: &dyn SelfModelStore) -> Result<(), SelfModelError> {
        let snapshot = self.snapshot();
        store.save(&snapshot)
    }

    pub fn config(&self) -> &SelfModelConfig {
        &self.config
    }

    /// Record one arm outcome.
    pub fn update(
        &self,
        problem: &str,
        context: &Map<String, Value>,
        playbook: &str,
        outcome: &ArmOutcome,
    ) -> Result<ArmStats, SelfModelError> {
        self.update_at(problem, context, playbook, outcome, Utc::now())
    }

    pub fn update_at(
        &self,
        problem: &str,
        context: &Map<String, Value>,
        playbook: &str,
        outcome: &ArmOutcome,
        now: DateTime<Utc>,
    ) -> Result<ArmStats, SelfModelError> {
        let key = ArmKey::new(problem_signature(problem, context), playbook);
        let mut arms = self.arms.write().map_err(|_| SelfModelError::LockPoisoned)?;
        let stats = arms.entry(key).or_insert_with(|| ArmStats::empty(now));
        stats.trials += 1.0;
        if outcome.won {
            stats.wins += 1.0;
        }
        stats.score_sum += outcome.score;
        stats.spend_ms += outcome.spend_ms;
        stats.last_update = now;
        debug!(
            playbook,
            trials = stats.trials,
            won = outcome.won,
            "self-model arm updated"
        );
        Ok(stats.clone())
    }

    /// Normalized budget weights for `names` under this problem.
    ///
    /// Falls back to a uniform distribution when every arm is unseen or the
    /// weight total is not positive.
    pub fn priors(
        &self,
        problem: &str,
        context: &Map<String, Value>,
        names: &[String],
    ) -> BTreeMap<String, f64> {
        if names.is_empty() {
            return BTreeMap::new();
        }
        let signature = problem_signature(problem, context);
        let arms = self.arms.read().unwrap_or_else(|poisoned| poisoned.into_inner());

        let stats: Vec<Option<&ArmStats>> = names
            .iter()
            .map(|name| {
                arms.get(&ArmKey::new(signature.clone(), name.clone()))
                    .filter(|s| s.is_seen())
            })
            .collect();

        if stats.iter().all(Option::is_none) {
            return uniform(names);
        }

        let total_trials: f64 = stats.iter().flatten().map(|s| s.trials).sum();
        let ucb_weight = self.config.ucb_weight;
        let raw: Vec<f64> = stats
            .iter()
            .map(|s| {
                let (ucb, efficiency) = match s {
                    Some(s) => (
                        (2.0 * (total_trials + 1.0).ln() / s.trials.max(1.0)).sqrt(),
                        s.efficiency(),
                    ),
                    None => (1.0, 0.0),
                };
                (ucb_weight * ucb + (1.0 - ucb_weight) * efficiency).max(MIN_ARM_WEIGHT)
            })
            .collect();

        let total: f64 = raw.iter().sum();
        if !(total > 0.0) || !total.is_finite() {
            return uniform(names);
        }
        names
            .iter()
            .cloned()
            .zip(raw.into_iter().map(|w| w / total))
            .collect()
    }

    pub fn stats(&self, problem: &str, context: &Map<String, Value>, playbook: &str) -> Option<ArmStats> {
        let key = ArmKey::new(problem_signature(problem, context), playbook);
        let arms = self.arms.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        arms.get(&key).cloned()
    }

    /// Copy of the full arm table.
    pub fn snapshot(&self) -> HashMap<ArmKey, ArmStats> {
        self.arms
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn arm_count(&self) -> usize {
        self.arms
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

impl Default for SelfModel {
    fn default() -> Self {
        Self::new(SelfModelConfig::default())
    }
}

fn uniform(names: &[String]) -> BTreeMap<String, f64> {
    let w = 1.0 / names.len() as f64;
    names.iter().map(|n| (n.clone(), w)).collect()
}
