use crate::config::MarketConfig;
use crate::error::EngineError;
use crate::metrics::EngineMetrics;
use market_auction::{auction, AuctionResult};
use market_evaluation::EvaluationAnnotator;
use market_handoff::{
    AllowAllPolicy, CapsuleContext, CodegenClient, HandoffError, HandoffOutcome, HandoffRequest,
    HandoffStage, PolicyAuthority, SimulatedCodegenClient, WinnerPipeline,
};
use market_ledger::{InMemoryLedger, Ledger};
use market_mechanism::topological_order;
use market_portfolio::{ArmRanker, ArmRun, PlaybookRegistry, PortfolioRun, PortfolioRunner, RegistryOrderRanker};
use market_proof::{ContractVerifier, ProofVerifier};
use market_self_model::{ArmOutcome, JsonFileSelfModelStore, SelfModel, SelfModelStore};
use market_types::{Brief, Candidate, CapsuleId, DecisionId};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Result of one market run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarketRun {
    pub decision_id: DecisionId,
    /// Set when the winner was delivered and recorded.
    pub capsule_id: Option<CapsuleId>,
    pub winners: Vec<String>,
    pub portfolio_arms_used: Vec<ArmRun>,
    /// Candidates that reached the auction.
    pub candidates: Vec<Candidate>,
    pub auction: AuctionResult,
    pub handoff: HandoffOutcome,
}

impl MarketRun {
    pub fn delivered(&self) -> bool {
        self.handoff.is_delivered()
    }
}

/// The innovation market orchestrator.
///
/// One run: validate brief, run the portfolio on the propose share of the
/// budget, annotate, PCC pre-filter, auction on the auction share, update
/// the self-model, hand off the winner.
pub struct InnovationEngine {
    config: MarketConfig,
    registry: Arc<PlaybookRegistry>,
    ranker: Arc<dyn ArmRanker>,
    verifier: Arc<dyn ContractVerifier>,
    policy: Arc<dyn PolicyAuthority>,
    codegen: Arc<dyn CodegenClient>,
    ledger: Arc<dyn Ledger>,
    self_model: Arc<SelfModel>,
    store: Option<Arc<dyn SelfModelStore>>,
    metrics: EngineMetrics,
}

impl InnovationEngine {
    /// Build an engine with simulated collaborators.
    ///
    /// When `config.self_model_path` is set the self-model is loaded from
    /// (and persisted to) that file.
    pub fn new(config: MarketConfig, registry: PlaybookRegistry) -> Result<Self, EngineError> {
        config.validate()?;
        let store: Option<Arc<dyn SelfModelStore>> = config
            .self_model_path
            .as_ref()
            .map(|p| Arc::new(JsonFileSelfModelStore::new(p)) as Arc<dyn SelfModelStore>);
        let self_model = match &store {
            Some(store) => SelfModel::load(config.self_model_config(), store.as_ref(), chrono::Utc::now()),
            None => SelfModel::new(config.self_model_config()),
        };
        Ok(Self {
            config,
            registry: Arc::new(registry),
            ranker: Arc::new(RegistryOrderRanker),
            verifier: Arc::new(ProofVerifier),
            policy: Arc::new(AllowAllPolicy),
            codegen: Arc::new(SimulatedCodegenClient::new()),
            ledger: Arc::new(InMemoryLedger::new()),
            self_model: Arc::new(self_model),
            store,
            metrics: EngineMetrics::new(),
        })
    }

    pub fn with_ranker(mut self, ranker: Arc<dyn ArmRanker>) -> Self {
        self.ranker = ranker;
        self
    }

    pub fn with_verifier(mut self, verifier: Arc<dyn ContractVerifier>) -> Self {
        self.verifier = verifier;
        self
    }

    pub fn with_policy(mut self, policy: Arc<dyn PolicyAuthority>) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_codegen(mut self, codegen: Arc<dyn CodegenClient>) -> Self {
        self.codegen = codegen;
        self
    }

    pub fn with_ledger(mut self, ledger: Arc<dyn Ledger>) -> Self {
        self.ledger = ledger;
        self
    }

    /// Replace the self-model store and reload the model from it.
    pub fn with_self_model_store(mut self, store: Arc<dyn SelfModelStore>) -> Self {
        self.self_model = Arc::new(SelfModel::load(
            self.config.self_model_config(),
            store.as_ref(),
            chrono::Utc::now(),
        ));
        self.store = Some(store);
        self
    }

    pub fn config(&self) -> &MarketConfig {
        &self.config
    }

    pub fn metrics(&self) -> &EngineMetrics {
        &self.metrics
    }

    pub fn self_model(&self) -> &Arc<SelfModel> {
        &self.self_model
    }

    pub fn ledger(&self) -> &Arc<dyn Ledger> {
        &self.ledger
    }

    /// Run one market round for `brief`.
    pub async fn run(
        &mut self,
        brief: &Brief,
        total_budget_ms: u64,
        identity_context: &Map<String, Value>,
    ) -> Result<MarketRun, EngineError> {
        brief.validate()?;
        let decision_id = DecisionId::new();
        let propose_budget = self.config.propose_budget_ms(total_budget_ms);
        let auction_budget = self.config.auction_budget_ms(total_budget_ms);
        info!(
            decision = %decision_id,
            brief = %brief.id,
            total_budget_ms,
            propose_budget,
            auction_budget,
            "market run started"
        );

        let runner = PortfolioRunner::new(
            Arc::clone(&self.registry),
            Arc::clone(&self.ranker),
            Arc::clone(&self.self_model),
        )
        .with_config(self.config.runner_config());
        let portfolio = runner.run(brief, propose_budget, &decision_id).await;

        let annotator = EvaluationAnnotator::with_verifier(Arc::clone(&self.verifier));
        let annotated = annotator.annotate_all(portfolio.candidates.clone());
        let annotated_count = annotated.len();
        let survivors = self.prefilter(annotated, brief, &decision_id);
        let pcc_filtered = annotated_count - survivors.len();

        let result = auction(&survivors, auction_budget);
        self.metrics.record_run(
            portfolio.offered,
            portfolio.filtered_out(),
            pcc_filtered,
            portfolio.arms_used.iter().filter(|a| !a.succeeded()).count(),
        );

        self.update_self_model(brief, &portfolio, &survivors, &result);

        let context = self.capsule_context(total_budget_ms, propose_budget, auction_budget, &portfolio, &survivors, &result);
        let pipeline = WinnerPipeline::new(
            Arc::clone(&self.verifier),
            Arc::clone(&self.policy),
            Arc::clone(&self.codegen),
            Arc::clone(&self.ledger),
        );
        let outcome = pipeline
            .handoff(HandoffRequest {
                brief,
                decision_id: &decision_id,
                candidates: &survivors,
                auction: &result,
                identity_context,
                context,
            })
            .await;

        let handoff = match outcome {
            Ok(outcome) => outcome,
            Err(e) => {
                if matches!(e, HandoffError::NoWinners) {
                    self.metrics.record_no_winner();
                }
                warn!(decision = %decision_id, code = e.code(), error = %e, "market run ended without hand-off");
                return Err(e.into());
            }
        };
        match &handoff {
            HandoffOutcome::Delivered(_) => self.metrics.record_delivered(),
            HandoffOutcome::Rejected { stage: HandoffStage::ProofValidation, .. } => {
                self.metrics.record_proof_rejection()
            }
            HandoffOutcome::Rejected { stage: HandoffStage::PolicyValidation, .. } => {
                self.metrics.record_policy_rejection()
            }
        }

        let capsule_id = handoff.receipt().map(|r| r.capsule_id.clone());
        info!(
            decision = %decision_id,
            winners = ?result.winners,
            delivered = handoff.is_delivered(),
            "market run finished"
        );
        Ok(MarketRun {
            decision_id,
            capsule_id,
            winners: result.winners.clone(),
            portfolio_arms_used: portfolio.arms_used,
            candidates: survivors,
            auction: result,
            handoff,
        })
    }

    /// Keep candidates passing the extended check when pre-filtering is on.
    fn prefilter(&self, candidates: Vec<Candidate>, brief: &Brief, decision_id: &DecisionId) -> Vec<Candidate> {
        if !self.config.pcc_prefilter {
            return candidates;
        }
        candidates
            .into_iter()
            .filter(|c| match self.verifier.check_candidate_extended(c, &brief.success) {
                Ok(proof) if proof.ok => true,
                Ok(proof) => {
                    debug!(decision = %decision_id, candidate = %c.id, violations = ?proof.violations, "pcc pre-filter dropped candidate");
                    false
                }
                Err(e) => {
                    warn!(decision = %decision_id, candidate = %c.id, code = e.code(), error = %e, "pcc pre-filter check failed");
                    false
                }
            })
            .collect()
    }

    /// One update per arm used: won if the arm owns a winner, best surviving
    /// `fae` as score, allocation as spend.
    fn update_self_model(&self, brief: &Brief, portfolio: &PortfolioRun, survivors: &[Candidate], result: &AuctionResult) {
        for arm in &portfolio.arms_used {
            let owned = survivors
                .iter()
                .filter(|c| c.provenance.portfolio_arm.as_deref() == Some(arm.name.as_str()));
            let mut won = false;
            let mut best = 0.0f64;
            for c in owned {
                won |= result.is_winner(&c.id);
                best = best.max(c.scores.fae.filter(|f| f.is_finite()).unwrap_or(0.0));
            }
            let outcome = ArmOutcome::new(won, best, arm.allocation_ms as f64);
            if let Err(e) = self.self_model.update(&brief.problem, &brief.context, &arm.name, &outcome) {
                warn!(arm = %arm.name, code = e.code(), error = %e, "self-model update failed");
            }
        }
        if let Some(store) = &self.store {
            if let Err(e) = self.self_model.persist(store.as_ref()) {
                warn!(code = e.code(), error = %e, "self-model persistence failed");
            }
        }
    }

    fn capsule_context(
        &self,
        total_budget_ms: u64,
        propose_budget: u64,
        auction_budget: i64,
        portfolio: &PortfolioRun,
        survivors: &[Candidate],
        result: &AuctionResult,
    ) -> CapsuleContext {
        let compiled: BTreeMap<&str, Value> = survivors
            .iter()
            .filter(|c| result.is_winner(&c.id))
            .map(|c| {
                let order = topological_order(c.mechanism())
                    .map(|o| json!(o))
                    .unwrap_or(Value::Null);
                (c.id.as_str(), order)
            })
            .collect();
        let playbook_dag = json!({
            "ranked": portfolio.ranked,
            "arms": portfolio.arms_used,
            "compiled": compiled,
        });

        let mut cost_breakdown = BTreeMap::from([
            ("total_budget_ms".to_string(), total_budget_ms as f64),
            ("propose_budget_ms".to_string(), propose_budget as f64),
            ("auction_budget_ms".to_string(), auction_budget as f64),
        ]);
        for arm in &portfolio.arms_used {
            cost_breakdown.insert(format!("arm:{}", arm.name), arm.allocation_ms as f64);
        }

        let env = BTreeMap::from([
            ("engine_version".to_string(), json!(env!("CARGO_PKG_VERSION"))),
            ("mutation_seed".to_string(), json!(self.config.mutation_seed)),
            ("mutate_outputs".to_string(), json!(self.config.mutate_outputs)),
            ("pcc_prefilter".to_string(), json!(self.config.pcc_prefilter)),
            ("half_life_days".to_string(), json!(self.config.half_life_days)),
        ]);

        CapsuleContext {
            playbook_dag,
            cost_breakdown,
            env,
        }
    }
}
