#![deny(unsafe_code)]
//! # market-types
//!
//! Shared data model for the Innovation Market.
//!
//! ## Key Types
//!
//! - [`Brief`] - Immutable problem statement with success criteria
//! - [`MechanismGraph`] - Ordered [`Op`] nodes plus `[from, to]` [`Edge`]s
//! - [`CapabilitySpec`] - I/O schema, rate limits, obligations, rollback contract
//! - [`Candidate`] - A playbook proposal with scores, evidence and provenance
//! - [`ContentHash`] - BLAKE3 content-addressed identifier
//! - [`DecisionId`] / [`CapsuleId`] - Correlation and ledger identifiers

pub mod brief;
pub mod candidate;
pub mod capability;
pub mod error;
pub mod hash;
pub mod ids;
pub mod mechanism;

pub use brief::{Brief, SuccessCriteria};
pub use candidate::{Candidate, CandidateSpec, Evidence, Provenance, Scores};
pub use capability::{CapabilitySpec, Obligations, RollbackContract, RATE_LIMIT_KEYS};
pub use error::{BriefError, ContentHashError};
pub use hash::ContentHash;
pub use ids::{CapsuleId, DecisionId};
pub use mechanism::{Edge, MechanismGraph, Op};
