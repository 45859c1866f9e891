#![deny(unsafe_code)]
//! # market-handoff
//!
//! Turns an auction result into a delivered patch request.
//!
//! ## Pipeline
//!
//! 1. Resolve winners from the auction result (none is an error)
//! 2. Extended proof check of the first winner against the brief
//! 3. Policy authority validation (fail-closed)
//! 4. Submit a [`PatchBrief`] to the [`CodegenClient`]
//! 5. Record a design capsule in the ledger

pub mod codegen;
pub mod error;
pub mod pipeline;
pub mod policy;

pub use codegen::{CodegenClient, CodegenError, CodegenTicket, PatchBrief, SimulatedCodegenClient, TicketStatus};
pub use error::HandoffError;
pub use pipeline::{
    CapsuleContext, HandoffOutcome, HandoffReceipt, HandoffRequest, HandoffStage, RejectionDetails,
    WinnerPipeline,
};
pub use policy::{AllowAllPolicy, PolicyAuthority, PolicyError, PolicyRequest, PolicyVerdict, StaticPolicy};
