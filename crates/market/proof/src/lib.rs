#![deny(unsafe_code)]
//! # market-proof
//!
//! Proof-carrying-code verification for market candidates.
//!
//! ## Key Types
//!
//! - [`ContractVerifier`] - Base and extended contract checks
//! - [`ProofVerifier`] - Built-in stateless verifier
//! - [`ProofResult`] - `{ok, checks, violations}` with machine-readable codes
//! - [`Violation`] - Typed violation, rendered as its code

pub mod error;
pub mod types;
pub mod verifier;

pub use error::ProofError;
pub use types::{ProofResult, Violation};
pub use verifier::{ContractVerifier, ProofVerifier, POST_EVIDENCE_KEYS};
