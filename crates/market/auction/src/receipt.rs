use market_types::ContentHash;
use serde::{Deserialize, Serialize};

/// Selection rule applied by an auction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuctionRule {
    /// Greedy in rank order while cumulative cost stays within budget.
    GreedyValueWithinBudget,
    /// Non-positive budget: only the top-ranked candidate.
    Top1NoBudget,
}

impl AuctionRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GreedyValueWithinBudget => "greedy_value_within_budget",
            Self::Top1NoBudget => "top1_no_budget",
        }
    }
}

/// One ranked candidate as recorded in the receipt.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RankedEntry {
    pub candidate_id: String,
    pub playbook: String,
    pub value: f64,
    pub fae: f64,
    pub novelty: f64,
    pub risk: f64,
    pub cost_ms: f64,
}

/// Hashed audit record of an auction.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarketReceipt {
    pub rule: AuctionRule,
    pub budget_ms: i64,
    pub ranked: Vec<RankedEntry>,
    pub selected: Vec<String>,
    pub spend_ms: f64,
    /// BLAKE3 over the canonical receipt body, this field excluded.
    pub hash: ContentHash,
}

#[derive(Serialize)]
struct ReceiptBody<'a> {
    rule: AuctionRule,
    budget_ms: i64,
    ranked: &'a [RankedEntry],
    selected: &'a [String],
    spend_ms: f64,
}

impl MarketReceipt {
    pub fn new(
        rule: AuctionRule,
        budget_ms: i64,
        ranked: Vec<RankedEntry>,
        selected: Vec<String>,
        spend_ms: f64,
    ) -> Self {
        let mut receipt = Self {
            rule,
            budget_ms,
            ranked,
            selected,
            spend_ms,
            hash: ContentHash::zero(),
        };
        receipt.hash = receipt.compute_hash();
        receipt
    }

    /// Hash of the canonical body (sorted keys, `hash` excluded).
    pub fn compute_hash(&self) -> ContentHash {
        let body = ReceiptBody {
            rule: self.rule,
            budget_ms: self.budget_ms,
            ranked: &self.ranked,
            selected: &self.selected,
            spend_ms: self.spend_ms,
        };
        match ContentHash::of_json(&body) {
            Ok(hash) => hash,
            // Unreachable for strings and finite numbers.
            Err(e) => {
                tracing::warn!(error = %e, "receipt body not serializable, hashing debug form");
                ContentHash::hash(format!("{:?}", self.ranked).as_bytes())
            }
        }
    }

    /// Recompute the body hash and compare it to the recorded one.
    pub fn verify(&self) -> bool {
        self.compute_hash() == self.hash
    }
}
