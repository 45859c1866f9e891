/// Errors from the mechanism DSL.
#[derive(Debug, thiserror::Error)]
pub enum MechanismError {
    #[error("invalid mechanism graph: {}", .0.join(", "))]
    InvalidGraph(Vec<String>),
}

impl MechanismError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidGraph(_) => "mechanism.graph.invalid",
        }
    }
}
