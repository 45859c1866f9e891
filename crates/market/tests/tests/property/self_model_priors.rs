//! Property tests: self-model priors always form a distribution.

use chrono::Utc;
use market_self_model::{ArmOutcome, SelfModel, SelfModelConfig, MIN_ARM_WEIGHT};
use proptest::prelude::*;
use serde_json::Map;

fn names(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("arm{}", i)).collect()
}

proptest! {
    /// Unseen arms share the budget uniformly.
    #[test]
    fn unseen_arms_are_uniform(n in 1usize..10) {
        let model = SelfModel::new(SelfModelConfig::default());
        let priors = model.priors("problem", &Map::new(), &names(n));
        prop_assert_eq!(priors.len(), n);
        let total: f64 = priors.values().sum();
        prop_assert!((total - 1.0).abs() < 1e-9);
        for w in priors.values() {
            prop_assert!((w - 1.0 / n as f64).abs() < 1e-12);
        }
    }

    /// After arbitrary outcomes priors still sum to one with positive weights.
    #[test]
    fn learned_priors_are_normalized(
        n in 1usize..6,
        outcomes in prop::collection::vec((0usize..6, any::<bool>(), 0.0f64..1.0, 0.0f64..20_000.0), 0..30),
    ) {
        let model = SelfModel::new(SelfModelConfig::default());
        let arms = names(n);
        let now = Utc::now();
        for (arm, won, score, spend) in outcomes {
            model
                .update_at("problem", &Map::new(), &arms[arm % n], &ArmOutcome::new(won, score, spend), now)
                .unwrap();
        }
        let priors = model.priors("problem", &Map::new(), &arms);
        let total: f64 = priors.values().sum();
        prop_assert!((total - 1.0).abs() < 1e-9);
        for w in priors.values() {
            prop_assert!(*w >= MIN_ARM_WEIGHT / (n as f64 * 10.0));
        }
    }
}
