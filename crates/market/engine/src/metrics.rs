use serde::{Deserialize, Serialize};

/// Engine runtime metrics.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineMetrics {
    /// Runs that passed brief validation.
    pub runs: u64,
    /// Runs ending in a delivered hand-off.
    pub handoffs_delivered: u64,
    pub proof_rejections: u64,
    pub policy_rejections: u64,
    /// Runs with no auction winner.
    pub no_winner_runs: u64,
    /// Candidates offered to the novelty filter, variants included.
    pub candidates_generated: u64,
    /// Candidates dropped as duplicates or over the parallel cap.
    pub candidates_deduplicated: u64,
    /// Candidates dropped by the PCC pre-filter.
    pub candidates_pcc_filtered: u64,
    /// Arms whose playbook failed.
    pub arm_failures: u64,
}

impl EngineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_run(&mut self, offered: usize, deduplicated: usize, pcc_filtered: usize, arm_failures: usize) {
        self.runs += 1;
        self.candidates_generated += offered as u64;
        self.candidates_deduplicated += deduplicated as u64;
        self.candidates_pcc_filtered += pcc_filtered as u64;
        self.arm_failures += arm_failures as u64;
    }

    pub fn record_delivered(&mut self) {
        self.handoffs_delivered += 1;
    }

    pub fn record_proof_rejection(&mut self) {
        self.proof_rejections += 1;
    }

    pub fn record_policy_rejection(&mut self) {
        self.policy_rejections += 1;
    }

    pub fn record_no_winner(&mut self) {
        self.no_winner_runs += 1;
    }

    pub fn delivery_rate(&self) -> f64 {
        if self.runs == 0 {
            return 0.0;
        }
        self.handoffs_delivered as f64 / self.runs as f64
    }
}
