/// Errors from parsing a [`crate::ContentHash`].
#[derive(Debug, thiserror::Error)]
pub enum ContentHashError {
    #[error("invalid hex length: {0} (expected 64)")]
    InvalidLength(usize),
    #[error("invalid hex character")]
    InvalidHex,
}

/// Caller-input errors for malformed briefs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BriefError {
    #[error("brief id is empty")]
    EmptyId,
    #[error("brief problem statement is empty")]
    EmptyProblem,
    #[error("brief success criteria contain an empty key")]
    EmptySuccessKey,
}

impl BriefError {
    /// Machine-readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyId => "brief.id.empty",
            Self::EmptyProblem => "brief.problem.empty",
            Self::EmptySuccessKey => "brief.success.key.empty",
        }
    }
}
