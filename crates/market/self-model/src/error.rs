/// Errors from the self-model and its persistence adapters.
#[derive(Debug, thiserror::Error)]
pub enum SelfModelError {
    #[error("self-model I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("self-model serialization error: {0}")]
    Serialization(String),
    #[error("self-model lock poisoned")]
    LockPoisoned,
}

impl SelfModelError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Io(_) => "self_model.io",
            Self::Serialization(_) => "self_model.serialization",
            Self::LockPoisoned => "self_model.lock_poisoned",
        }
    }
}
