use crate::codegen::CodegenError;
use market_ledger::LedgerError;

/// Errors that abort a hand-off. Gate failures are not errors; they are
/// reported as [`HandoffOutcome::Rejected`](crate::HandoffOutcome::Rejected).
#[derive(Debug, thiserror::Error)]
pub enum HandoffError {
    #[error("auction result has no winners among the supplied candidates")]
    NoWinners,
    #[error("codegen submission failed: {0}")]
    Codegen(#[from] CodegenError),
    #[error("capsule write failed: {0}")]
    Ledger(#[from] LedgerError),
}

impl HandoffError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoWinners => "no_winners_in_auction_result",
            Self::Codegen(e) => e.code(),
            Self::Ledger(e) => e.code(),
        }
    }
}
