#![deny(unsafe_code)]
//! # market-self-model
//!
//! Decaying per-arm performance memory that biases how a market run splits
//! its budget across playbooks.
//!
//! Arms are keyed by `(problem signature, playbook)`. Outcomes go in through
//! [`SelfModel::update`]; budget weights come out of [`SelfModel::priors`].
//! State survives restarts through a [`SelfModelStore`], with counters halved
//! every `half_life_days` on load.

pub mod error;
pub mod model;
pub mod persistence;
pub mod types;

pub use error::SelfModelError;
pub use model::{SelfModel, SelfModelConfig, MIN_ARM_WEIGHT};
pub use persistence::{InMemorySelfModelStore, JsonFileSelfModelStore, SelfModelStore};
pub use types::{
    problem_signature, ArmKey, ArmOutcome, ArmStats, SIGNATURE_CONTEXT_KEYS,
    SIGNATURE_PROBLEM_CHARS,
};
