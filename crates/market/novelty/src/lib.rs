#![deny(unsafe_code)]
//! # market-novelty
//!
//! Per-run novelty reservoir. Each candidate is hashed twice (mechanism graph
//! and capability spec); novelty in either dimension is enough to accept it.

pub mod reservoir;

pub use reservoir::{NoveltyReservoir, NoveltyVerdict};
