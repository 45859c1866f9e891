use market_types::{Candidate, ContentHash};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Why the reservoir accepted or rejected a candidate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoveltyVerdict {
    /// Both the mechanism and the capability are unseen.
    NovelBoth,
    /// Only the mechanism graph is unseen.
    NovelMechanism,
    /// Only the capability spec is unseen.
    NovelCapability,
    /// Neither dimension is new.
    Duplicate,
}

impl NoveltyVerdict {
    pub fn accepted(&self) -> bool {
        !matches!(self, Self::Duplicate)
    }
}

/// Per-run structural deduplication filter.
///
/// A candidate is rejected only when both its mechanism hash and its
/// capability hash have been seen before.
#[derive(Debug, Default)]
pub struct NoveltyReservoir {
    mechanisms: HashSet<ContentHash>,
    capabilities: HashSet<ContentHash>,
}

impl NoveltyReservoir {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer a candidate; records its hashes when accepted.
    pub fn offer(&mut self, candidate: &Candidate) -> NoveltyVerdict {
        let hashes = ContentHash::of_json(&candidate.spec.mechanism)
            .and_then(|m| ContentHash::of_json(&candidate.spec.capability).map(|c| (m, c)));
        let (mechanism, capability) = match hashes {
            Ok(pair) => pair,
            Err(e) => {
                warn!(candidate = %candidate.id, error = %e, "candidate not hashable, accepting");
                return NoveltyVerdict::NovelBoth;
            }
        };

        let new_mechanism = !self.mechanisms.contains(&mechanism);
        let new_capability = !self.capabilities.contains(&capability);
        let verdict = match (new_mechanism, new_capability) {
            (true, true) => NoveltyVerdict::NovelBoth,
            (true, false) => NoveltyVerdict::NovelMechanism,
            (false, true) => NoveltyVerdict::NovelCapability,
            (false, false) => NoveltyVerdict::Duplicate,
        };

        if verdict.accepted() {
            self.mechanisms.insert(mechanism);
            self.capabilities.insert(capability);
        } else {
            debug!(candidate = %candidate.id, "duplicate candidate rejected");
        }
        verdict
    }

    /// Accept candidates in iteration order until `k` have been accepted.
    pub fn filter_portfolio<I>(&mut self, candidates: I, k: usize) -> Vec<Candidate>
    where
        I: IntoIterator<Item = Candidate>,
    {
        let mut accepted = Vec::new();
        for candidate in candidates {
            if accepted.len() >= k {
                break;
            }
            if self.offer(&candidate).accepted() {
                accepted.push(candidate);
            }
        }
        accepted
    }

    /// Distinct `(mechanism, capability)` hashes seen so far.
    pub fn seen_counts(&self) -> (usize, usize) {
        (self.mechanisms.len(), self.capabilities.len())
    }

    pub fn reset(&mut self) {
        self.mechanisms.clear();
        self.capabilities.clear();
    }
}
