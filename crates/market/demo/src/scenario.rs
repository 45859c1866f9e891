//! Simulated briefs and playbooks for the demo.

use market_portfolio::{PlaybookError, PlaybookRegistry, RegistryError, StaticPlaybook, TemplatePlaybook};
use market_types::{Brief, Candidate, MechanismGraph, Obligations, Op, RollbackContract};
use serde_json::{json, Map};
use std::sync::Arc;
use std::time::Duration;

pub struct Scenario;

impl Scenario {
    /// Latency brief the template and handcrafted arms can both satisfy.
    pub fn checkout_brief() -> Brief {
        Brief::new("checkout-latency", "Reduce p99 checkout latency below 300ms")
            .with_context("domain", "payments")
            .with_context("risk_tier", "medium")
            .with_success_pre(["input.valid"])
            .with_success_post(["tests.ok"])
            .with_hint("variants", 2)
    }

    /// Same problem, but the template arm declares a burst rate limit.
    pub fn burst_brief() -> Brief {
        Self::checkout_brief().with_hint("rate_limits", json!({"burst": 20, "qps": 200}))
    }

    /// Template, handcrafted and flaky arms.
    pub fn registry() -> Result<PlaybookRegistry, RegistryError> {
        PlaybookRegistry::new()
            .with(Arc::new(
                TemplatePlaybook::new("template")
                    .with_min_budget_ms(100)
                    .with_evidence("tests", json!({"ok": true, "suite": "checkout-regression"})),
            ))?
            .with(Arc::new(
                StaticPlaybook::new("handcrafted", vec![Self::cache_candidate()])
                    .with_delay(Duration::from_millis(20)),
            ))?
            .with(Arc::new(StaticPlaybook::failing(
                "flaky",
                PlaybookError::Unavailable("sandbox offline".into()),
            )))
    }

    /// Fan-out cache warmer with a join step.
    fn cache_candidate() -> Candidate {
        let graph = MechanismGraph::new()
            .with_op(Op::new("profile").with_param("samples", 500))
            .with_op(Op::new("cache_warm").with_param("ttl_s", 60))
            .with_op(Op::new("prefetch").with_param("depth", 2))
            .with_op(Op::new("merge"))
            .with_edge(0, 1)
            .with_edge(0, 2)
            .with_edge(1, 3)
            .with_edge(2, 3);
        let mut params = Map::new();
        params.insert("flag".into(), json!("checkout.cache"));
        Candidate::new("cache-warmer", "handcrafted", graph)
            .with_obligations(Obligations::new(["input.valid"], ["tests.ok", "latency.p99"]))
            .with_rollback(RollbackContract::new("feature_flag_off", params))
            .with_evidence("tests", json!({"ok": true}))
            .with_evidence("invariants", json!(["idempotent"]))
            .with_artifact(json!({"kind": "patch", "files": ["checkout/cache.rs"]}))
            .with_risk(0.2)
            .with_cost_ms(400.0)
    }
}
