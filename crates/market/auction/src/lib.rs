#![deny(unsafe_code)]
//! # market-auction
//!
//! Deterministic, auditable winner selection.
//!
//! Candidates are ranked by `fae + 0.05·novelty − 0.10·risk` with a total
//! tie-break order, then selected greedily within a millisecond budget. Every
//! auction emits a [`MarketReceipt`] whose BLAKE3 hash covers the full ranked
//! list and selection.

pub mod auction;
pub mod receipt;

pub use auction::{auction, rank, value, AuctionResult, NOVELTY_WEIGHT, RISK_WEIGHT};
pub use receipt::{AuctionRule, MarketReceipt, RankedEntry};
