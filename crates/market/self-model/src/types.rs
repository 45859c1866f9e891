use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Context keys folded into the problem signature.
pub const SIGNATURE_CONTEXT_KEYS: [&str; 4] = ["domain", "risk_tier", "scale", "targets"];

/// Characters of problem text folded into the problem signature.
pub const SIGNATURE_PROBLEM_CHARS: usize = 512;

/// Coarse problem signature: BLAKE3 over the problem prefix and the
/// signature subset of the context, truncated to 16 hex characters.
pub fn problem_signature(problem: &str, context: &Map<String, Value>) -> String {
    let prefix: String = problem.chars().take(SIGNATURE_PROBLEM_CHARS).collect();
    let subset: BTreeMap<&str, &Value> = SIGNATURE_CONTEXT_KEYS
        .iter()
        .filter_map(|k| context.get(*k).map(|v| (*k, v)))
        .collect();

    let mut hasher = blake3::Hasher::new();
    hasher.update(prefix.as_bytes());
    hasher.update(b"\n");
    // A map of JSON values always serializes.
    hasher.update(serde_json::to_string(&subset).unwrap_or_default().as_bytes());
    hasher.finalize().to_hex()[..16].to_string()
}

/// Key of one bandit arm: a playbook under a problem signature.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ArmKey {
    pub signature: String,
    pub playbook: String,
}

impl ArmKey {
    pub fn new(signature: impl Into<String>, playbook: impl Into<String>) -> Self {
        Self {
            signature: signature.into(),
            playbook: playbook.into(),
        }
    }
}

/// Accumulated performance of one arm.
///
/// Counters are fractional because persisted state decays over time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArmStats {
    pub trials: f64,
    pub wins: f64,
    pub spend_ms: f64,
    pub score_sum: f64,
    pub last_update: DateTime<Utc>,
}

impl ArmStats {
    pub fn empty(now: DateTime<Utc>) -> Self {
        Self {
            trials: 0.0,
            wins: 0.0,
            spend_ms: 0.0,
            score_sum: 0.0,
            last_update: now,
        }
    }

    pub fn is_seen(&self) -> bool {
        self.trials > 0.0
    }

    pub fn mean_score(&self) -> f64 {
        if self.trials > 0.0 {
            self.score_sum / self.trials
        } else {
            0.0
        }
    }

    pub fn avg_spend_ms(&self) -> f64 {
        if self.trials > 0.0 {
            self.spend_ms / self.trials
        } else {
            0.0
        }
    }

    /// Mean score discounted by average spend (per second).
    pub fn efficiency(&self) -> f64 {
        self.mean_score() / (1.0 + self.avg_spend_ms() / 1000.0)
    }

    pub fn win_rate(&self) -> f64 {
        if self.trials > 0.0 {
            self.wins / self.trials
        } else {
            0.0
        }
    }

    /// Scale counters by `0.5^(elapsed_days / half_life_days)`.
    pub fn decayed(&self, now: DateTime<Utc>, half_life_days: f64) -> Self {
        let elapsed_days =
            (now - self.last_update).num_milliseconds().max(0) as f64 / 86_400_000.0;
        let factor = if half_life_days > 0.0 {
            0.5f64.powf(elapsed_days / half_life_days)
        } else {
            1.0
        };
        Self {
            trials: self.trials * factor,
            wins: self.wins * factor,
            spend_ms: self.spend_ms * factor,
            score_sum: self.score_sum * factor,
            last_update: now.max(self.last_update),
        }
    }
}

/// Result of one arm's participation in a market run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArmOutcome {
    pub won: bool,
    pub score: f64,
    pub spend_ms: f64,
}

impl ArmOutcome {
    pub fn new(won: bool, score: f64, spend_ms: f64) -> Self {
        Self {
            won,
            score,
            spend_ms,
        }
    }
}
