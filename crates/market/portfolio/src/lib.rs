#![deny(unsafe_code)]
//! # market-portfolio
//!
//! Runs a budget-constrained portfolio of playbooks for one brief.
//!
//! ## Flow
//!
//! 1. Rank registered arms through an [`ArmRanker`] (registry order on failure)
//! 2. Split the budget by self-model priors with per-arm floors
//! 3. Launch every selected arm concurrently and join
//! 4. Tag, optionally mutate, and novelty-filter the produced candidates

pub mod budget;
pub mod error;
pub mod playbook;
pub mod ranker;
pub mod registry;
pub mod runner;

pub use budget::split_budget;
pub use error::{PlaybookError, RankError, RegistryError};
pub use playbook::{Playbook, StaticPlaybook, TemplatePlaybook, DEFAULT_PIPELINE};
pub use ranker::{resolve_ranking, ArmRanker, FixedRanker, RegistryOrderRanker, TaskContext};
pub use registry::PlaybookRegistry;
pub use runner::{ArmRun, PortfolioRun, PortfolioRunner, RunnerConfig};
