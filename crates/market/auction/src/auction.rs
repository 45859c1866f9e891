use crate::receipt::{AuctionRule, MarketReceipt, RankedEntry};
use market_types::{Candidate, Scores};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::debug;

pub const NOVELTY_WEIGHT: f64 = 0.05;
pub const RISK_WEIGHT: f64 = 0.10;

fn score(x: Option<f64>) -> f64 {
    x.filter(|v| v.is_finite()).unwrap_or(0.0)
}

/// Auction value of a score set. Missing or non-finite scores count as 0.
pub fn value(scores: &Scores) -> f64 {
    score(scores.fae) + NOVELTY_WEIGHT * score(scores.novelty) - RISK_WEIGHT * score(scores.risk)
}

fn entry(candidate: &Candidate) -> RankedEntry {
    RankedEntry {
        candidate_id: candidate.id.clone(),
        playbook: candidate.playbook.clone(),
        value: value(&candidate.scores),
        fae: score(candidate.scores.fae),
        novelty: score(candidate.scores.novelty),
        risk: score(candidate.scores.risk),
        cost_ms: score(candidate.scores.cost_ms).max(0.0),
    }
}

fn order(a: &RankedEntry, b: &RankedEntry) -> Ordering {
    b.value
        .total_cmp(&a.value)
        .then_with(|| a.risk.total_cmp(&b.risk))
        .then_with(|| b.novelty.total_cmp(&a.novelty))
        .then_with(|| a.candidate_id.cmp(&b.candidate_id))
}

/// Rank candidates: value desc, risk asc, novelty desc, id asc.
pub fn rank(candidates: &[Candidate]) -> Vec<RankedEntry> {
    let mut ranked: Vec<RankedEntry> = candidates.iter().map(entry).collect();
    ranked.sort_by(order);
    ranked
}

/// Outcome of an auction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AuctionResult {
    /// Selected candidate ids in rank order.
    pub winners: Vec<String>,
    pub spend_ms: f64,
    pub market_receipt: MarketReceipt,
}

impl AuctionResult {
    pub fn has_winners(&self) -> bool {
        !self.winners.is_empty()
    }

    pub fn is_winner(&self, candidate_id: &str) -> bool {
        self.winners.iter().any(|w| w == candidate_id)
    }
}

/// Select winners within `budget_ms`.
///
/// A non-positive budget selects only the top candidate. Otherwise
/// candidates are taken greedily in rank order, skipping any whose cost
/// would push the cumulative spend past the budget.
pub fn auction(candidates: &[Candidate], budget_ms: i64) -> AuctionResult {
    let ranked = rank(candidates);
    let mut winners = Vec::new();
    let mut spend = 0.0;

    let rule = if budget_ms <= 0 {
        if let Some(top) = ranked.first() {
            winners.push(top.candidate_id.clone());
            spend = top.cost_ms;
        }
        AuctionRule::Top1NoBudget
    } else {
        let budget = budget_ms as f64;
        for e in &ranked {
            if spend + e.cost_ms <= budget {
                spend += e.cost_ms;
                winners.push(e.candidate_id.clone());
            }
        }
        AuctionRule::GreedyValueWithinBudget
    };

    debug!(
        rule = rule.as_str(),
        budget_ms,
        ranked = ranked.len(),
        winners = winners.len(),
        spend_ms = spend,
        "auction settled"
    );

    let market_receipt = MarketReceipt::new(rule, budget_ms, ranked, winners.clone(), spend);
    AuctionResult {
        winners,
        spend_ms: spend,
        market_receipt,
    }
}
