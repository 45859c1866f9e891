#![deny(unsafe_code)]
//! # market-evaluation
//!
//! Annotates candidates before the auction: attaches the base PCC check as
//! `evidence.pcc` and fills missing scores from structural estimators.
//! The annotator never drops a candidate.

pub mod annotator;
pub mod estimators;

pub use annotator::{EvaluationAnnotator, PCC_EVIDENCE_KEY};
pub use estimators::{clamp01, estimate, Estimates};
