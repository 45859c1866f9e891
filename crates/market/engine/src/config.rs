use crate::error::EngineError;
use market_portfolio::RunnerConfig;
use market_self_model::SelfModelConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Market configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketConfig {
    /// Share of the total budget given to the portfolio.
    pub propose_share: f64,
    /// Share of the total budget the auction may spend.
    pub auction_share: f64,
    /// Maximum arms launched per run.
    pub max_arms: usize,
    /// Candidates kept after novelty filtering.
    pub max_parallel: usize,
    /// Minimum per-arm allocation (ms).
    pub arm_floor_ms: u64,
    /// Minimum per-arm allocation after rescaling (ms).
    pub rescaled_floor_ms: u64,
    /// Offer a mutated variant of every produced candidate.
    pub mutate_outputs: bool,
    /// Drop candidates failing the extended proof check before the auction.
    pub pcc_prefilter: bool,
    /// Self-model decay half-life.
    pub half_life_days: f64,
    /// Salt for mutation jitter.
    pub mutation_seed: Option<u64>,
    /// Self-model state file; in-memory only when unset.
    pub self_model_path: Option<PathBuf>,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            propose_share: 0.6,
            auction_share: 0.2,
            max_arms: 4,
            max_parallel: 8,
            arm_floor_ms: 500,
            rescaled_floor_ms: 250,
            mutate_outputs: true,
            pcc_prefilter: true,
            half_life_days: 7.0,
            mutation_seed: None,
            self_model_path: None,
        }
    }
}

impl MarketConfig {
    /// Demo configuration: small floors and a fixed mutation seed.
    pub fn demo() -> Self {
        Self {
            max_arms: 3,
            max_parallel: 6,
            arm_floor_ms: 100,
            rescaled_floor_ms: 50,
            mutation_seed: Some(7),
            ..Self::default()
        }
    }

    /// Conservative configuration: fewer arms, no mutation, slower decay.
    pub fn strict() -> Self {
        Self {
            max_arms: 2,
            max_parallel: 4,
            mutate_outputs: false,
            pcc_prefilter: true,
            half_life_days: 14.0,
            ..Self::default()
        }
    }

    /// Load from a JSON file; absent fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self =
            serde_json::from_str(&contents).map_err(|e| EngineError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), EngineError> {
        let share_ok = |s: f64| s.is_finite() && s > 0.0 && s <= 1.0;
        if !share_ok(self.propose_share) {
            return Err(EngineError::InvalidConfig(format!(
                "propose_share must be in (0, 1], got {}",
                self.propose_share
            )));
        }
        if !share_ok(self.auction_share) {
            return Err(EngineError::InvalidConfig(format!(
                "auction_share must be in (0, 1], got {}",
                self.auction_share
            )));
        }
        if self.propose_share + self.auction_share > 1.0 {
            return Err(EngineError::InvalidConfig(
                "propose_share + auction_share exceeds 1".into(),
            ));
        }
        if self.max_arms == 0 || self.max_parallel == 0 {
            return Err(EngineError::InvalidConfig(
                "max_arms and max_parallel must be at least 1".into(),
            ));
        }
        if self.rescaled_floor_ms > self.arm_floor_ms {
            return Err(EngineError::InvalidConfig(
                "rescaled_floor_ms exceeds arm_floor_ms".into(),
            ));
        }
        if !(self.half_life_days.is_finite() && self.half_life_days > 0.0) {
            return Err(EngineError::InvalidConfig(format!(
                "half_life_days must be positive, got {}",
                self.half_life_days
            )));
        }
        Ok(())
    }

    pub fn runner_config(&self) -> RunnerConfig {
        RunnerConfig {
            max_arms: self.max_arms,
            max_parallel: self.max_parallel,
            arm_floor_ms: self.arm_floor_ms,
            rescaled_floor_ms: self.rescaled_floor_ms,
            mutate_outputs: self.mutate_outputs,
            mutation_seed: self.mutation_seed,
        }
    }

    pub fn self_model_config(&self) -> SelfModelConfig {
        SelfModelConfig {
            half_life_days: self.half_life_days,
            ..SelfModelConfig::default()
        }
    }

    /// Portfolio budget for a run.
    pub fn propose_budget_ms(&self, total_budget_ms: u64) -> u64 {
        (total_budget_ms as f64 * self.propose_share).floor() as u64
    }

    /// Auction budget for a run.
    pub fn auction_budget_ms(&self, total_budget_ms: u64) -> i64 {
        (total_budget_ms as f64 * self.auction_share).floor() as i64
    }
}
