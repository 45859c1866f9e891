use market_types::CapsuleId;

/// Errors from ledger stores.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("capsule already exists: {0}")]
    Duplicate(CapsuleId),
    #[error("capsule not found: {0}")]
    NotFound(CapsuleId),
    #[error("annotation '{key}' already set on capsule {capsule}")]
    AnnotationExists { capsule: CapsuleId, key: String },
    #[error("capsule id must not be empty")]
    EmptyId,
    #[error("ledger I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("ledger serialization error: {0}")]
    Serialization(String),
    #[error("ledger lock poisoned")]
    LockPoisoned,
}

impl LedgerError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Duplicate(_) => "ledger.capsule.duplicate",
            Self::NotFound(_) => "ledger.capsule.not_found",
            Self::AnnotationExists { .. } => "ledger.annotation.exists",
            Self::EmptyId => "ledger.capsule.id_empty",
            Self::Io(_) => "ledger.io",
            Self::Serialization(_) => "ledger.serialization",
            Self::LockPoisoned => "ledger.lock_poisoned",
        }
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}
