/// Errors raised by a contract verifier.
///
/// These are verifier failures, not contract violations: a candidate that
/// breaks its contract yields an `Ok(ProofResult)` with `ok == false`.
#[derive(Debug, thiserror::Error)]
pub enum ProofError {
    #[error("verifier unavailable: {0}")]
    Unavailable(String),
    #[error("malformed proof input: {0}")]
    MalformedInput(String),
}

impl ProofError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unavailable(_) => "proof.verifier.unavailable",
            Self::MalformedInput(_) => "proof.input.malformed",
        }
    }
}
