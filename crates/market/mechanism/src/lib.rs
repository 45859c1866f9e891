#![deny(unsafe_code)]
//! # market-mechanism
//!
//! The mechanism graph DSL: [`lint`] classifies a graph as valid or failing
//! (empty, malformed edges, cycles) with soft critique/repair warnings, and
//! [`Mutator`] produces jittered, batch- and repair-augmented variants that
//! are guaranteed to pass lint.

pub mod error;
pub mod mutator;
pub mod validator;

pub use error::MechanismError;
pub use mutator::{Mutator, DEFAULT_JITTER_PCT, MUTATION_NOVELTY};
pub use validator::{lint, topological_order, LintIssue, LintReport};
