use crate::budget::split_budget;
use crate::playbook::Playbook;
use crate::ranker::{resolve_ranking, ArmRanker, TaskContext};
use crate::registry::PlaybookRegistry;
use futures::future::join_all;
use market_mechanism::Mutator;
use market_novelty::NoveltyReservoir;
use market_self_model::SelfModel;
use market_types::{Brief, Candidate, DecisionId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Portfolio runner tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Arms launched per run, champion first.
    pub max_arms: usize,
    /// Candidates kept after novelty filtering.
    pub max_parallel: usize,
    pub arm_floor_ms: u64,
    pub rescaled_floor_ms: u64,
    /// Also offer a mutated variant of every produced candidate.
    pub mutate_outputs: bool,
    pub mutation_seed: Option<u64>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            max_arms: 4,
            max_parallel: 8,
            arm_floor_ms: 500,
            rescaled_floor_ms: 250,
            mutate_outputs: true,
            mutation_seed: None,
        }
    }
}

/// What one arm did during a run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArmRun {
    pub name: String,
    pub allocation_ms: u64,
    /// Candidates the playbook returned, before mutation and dedup.
    pub produced: usize,
    pub elapsed_ms: u64,
    /// Error code when the playbook failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ArmRun {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }

    pub fn over_budget(&self) -> bool {
        self.elapsed_ms > self.allocation_ms
    }
}

/// Output of one portfolio run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PortfolioRun {
    pub decision_id: DecisionId,
    /// Resolved arm order, before truncation to `max_arms`.
    pub ranked: Vec<String>,
    pub arms_used: Vec<ArmRun>,
    /// Novelty-filtered candidates, source before variant, arm order kept.
    pub candidates: Vec<Candidate>,
    /// Candidates offered to the reservoir, variants included.
    pub offered: usize,
}

impl PortfolioRun {
    pub fn arm(&self, name: &str) -> Option<&ArmRun> {
        self.arms_used.iter().find(|a| a.name == name)
    }

    pub fn filtered_out(&self) -> usize {
        self.offered.saturating_sub(self.candidates.len())
    }
}

/// Runs the selected playbooks concurrently under a split budget.
pub struct PortfolioRunner {
    registry: Arc<PlaybookRegistry>,
    ranker: Arc<dyn ArmRanker>,
    self_model: Arc<SelfModel>,
    config: RunnerConfig,
}

impl PortfolioRunner {
    pub fn new(
        registry: Arc<PlaybookRegistry>,
        ranker: Arc<dyn ArmRanker>,
        self_model: Arc<SelfModel>,
    ) -> Self {
        Self {
            registry,
            ranker,
            self_model,
            config: RunnerConfig::default(),
        }
    }

    pub fn with_config(mut self, config: RunnerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    pub fn registry(&self) -> &PlaybookRegistry {
        &self.registry
    }

    pub async fn run(&self, brief: &Brief, budget_ms: u64, decision_id: &DecisionId) -> PortfolioRun {
        let registry_order = self.registry.names();
        let task = TaskContext::from_brief(brief, decision_id);
        let ranked = resolve_ranking(self.ranker.rank(&task, &registry_order).await, &registry_order);

        let selected: Vec<Arc<dyn Playbook>> = ranked
            .iter()
            .take(self.config.max_arms)
            .filter_map(|name| self.registry.get(name))
            .collect();
        let names: Vec<String> = selected.iter().map(|p| p.name().to_string()).collect();

        let priors = self.self_model.priors(&brief.problem, &brief.context, &names);
        let allocations = split_budget(
            &names,
            &priors,
            budget_ms,
            self.config.arm_floor_ms,
            self.config.rescaled_floor_ms,
        );
        info!(
            decision = %decision_id,
            arms = ?names,
            allocations = ?allocations,
            budget_ms,
            "portfolio launching"
        );

        let launches = selected.iter().zip(&allocations).map(|(playbook, &alloc)| {
            let playbook = Arc::clone(playbook);
            async move {
                let started = Instant::now();
                let result = playbook.run(brief, alloc).await;
                (result, started.elapsed().as_millis() as u64)
            }
        });
        let results = join_all(launches).await;

        let mutator = match self.config.mutation_seed {
            Some(seed) => Mutator::new().with_seed(seed),
            None => Mutator::new(),
        };

        let mut arms_used = Vec::with_capacity(names.len());
        let mut offered: Vec<Candidate> = Vec::new();
        for ((name, &alloc), (result, elapsed_ms)) in names.iter().zip(&allocations).zip(results) {
            let (produced, error) = match result {
                Ok(candidates) => {
                    let produced = candidates.len();
                    for mut candidate in candidates {
                        tag(&mut candidate, name, alloc, brief, decision_id);
                        let variant = if self.config.mutate_outputs {
                            mutator.augment(&candidate)
                        } else {
                            None
                        };
                        offered.push(candidate);
                        if let Some(mut variant) = variant {
                            tag(&mut variant, name, alloc, brief, decision_id);
                            offered.push(variant);
                        }
                    }
                    (produced, None)
                }
                Err(e) => {
                    warn!(decision = %decision_id, arm = %name, code = e.code(), error = %e, "playbook failed");
                    (0, Some(e.code().to_string()))
                }
            };
            if elapsed_ms > alloc {
                warn!(decision = %decision_id, arm = %name, elapsed_ms, allocation_ms = alloc, "arm exceeded soft budget");
            }
            arms_used.push(ArmRun {
                name: name.clone(),
                allocation_ms: alloc,
                produced,
                elapsed_ms,
                error,
            });
        }

        let offered_count = offered.len();
        let mut reservoir = NoveltyReservoir::new();
        let candidates = reservoir.filter_portfolio(offered, self.config.max_parallel);
        debug!(
            decision = %decision_id,
            offered = offered_count,
            kept = candidates.len(),
            "novelty filter applied"
        );

        PortfolioRun {
            decision_id: decision_id.clone(),
            ranked,
            arms_used,
            candidates,
            offered: offered_count,
        }
    }
}

fn tag(candidate: &mut Candidate, arm: &str, alloc: u64, brief: &Brief, decision_id: &DecisionId) {
    candidate.provenance.portfolio_arm = Some(arm.to_string());
    candidate.provenance.decision_id = Some(decision_id.to_string());
    candidate.provenance.brief_id = Some(brief.id.clone());
    candidate.scores.cost_ms.get_or_insert(alloc as f64);
}
