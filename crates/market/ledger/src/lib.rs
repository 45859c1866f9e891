#![deny(unsafe_code)]
//! # market-ledger
//!
//! Durable provenance for market winners.
//!
//! A [`DesignCapsule`] records the brief, the playbook DAG, artifacts with
//! BLAKE3 barcodes, evaluation logs, counterfactuals, cost and environment
//! pins of one hand-off. The [`Ledger`] stores capsules write-once and only
//! allows new annotation keys afterwards.

pub mod capsule;
pub mod error;
pub mod store;

pub use capsule::DesignCapsule;
pub use error::LedgerError;
pub use store::{InMemoryLedger, JsonDirLedger, Ledger};
