/// Errors raised by a playbook run.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlaybookError {
    #[error("playbook failed: {0}")]
    Failed(String),
    #[error("playbook unavailable: {0}")]
    Unavailable(String),
    #[error("playbook budget too small: {0}ms")]
    BudgetTooSmall(u64),
}

impl PlaybookError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Failed(_) => "playbook.failed",
            Self::Unavailable(_) => "playbook.unavailable",
            Self::BudgetTooSmall(_) => "playbook.budget_too_small",
        }
    }
}

/// Errors raised by an arm ranker.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RankError {
    #[error("ranker unavailable: {0}")]
    Unavailable(String),
    #[error("ranker returned malformed output: {0}")]
    Malformed(String),
}

impl RankError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unavailable(_) => "rank.unavailable",
            Self::Malformed(_) => "rank.malformed",
        }
    }
}

/// Errors raised by the playbook registry.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RegistryError {
    #[error("playbook already registered: {0}")]
    Duplicate(String),
    #[error("playbook name must not be empty")]
    EmptyName,
}

impl RegistryError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Duplicate(_) => "registry.playbook.duplicate",
            Self::EmptyName => "registry.playbook.name_empty",
        }
    }
}
