#![deny(unsafe_code)]
//! # market-engine
//!
//! Orchestrates one Innovation Market run end to end.
//!
//! ## Run
//!
//! 1. Validate the [`Brief`](market_types::Brief)
//! 2. Run the playbook portfolio on the propose share of the budget
//! 3. Annotate candidates and drop those failing the extended proof check
//! 4. Auction the survivors on the auction share of the budget
//! 5. Feed arm outcomes back into the self-model and persist it
//! 6. Hand the winner to the winner pipeline and record a design capsule
//!
//! [`MarketConfig`] carries the knobs, [`EngineMetrics`] the counters.

pub mod config;
pub mod engine;
pub mod error;
pub mod metrics;

pub use config::MarketConfig;
pub use engine::{InnovationEngine, MarketRun};
pub use error::EngineError;
pub use metrics::EngineMetrics;
