use market_handoff::HandoffError;
use market_types::BriefError;

/// Errors from the innovation engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("malformed brief: {0}")]
    MalformedBrief(#[from] BriefError),
    #[error("hand-off failed: {0}")]
    Handoff(#[from] HandoffError),
    #[error("invalid market config: {0}")]
    InvalidConfig(String),
    #[error("market config I/O error: {0}")]
    ConfigIo(#[from] std::io::Error),
    #[error("market config parse error: {0}")]
    ConfigParse(String),
}

impl EngineError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::MalformedBrief(e) => e.code(),
            Self::Handoff(e) => e.code(),
            Self::InvalidConfig(_) => "engine.config.invalid",
            Self::ConfigIo(_) => "engine.config.io",
            Self::ConfigParse(_) => "engine.config.parse",
        }
    }
}
