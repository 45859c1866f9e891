//! Code-generation service contract.

use async_trait::async_trait;
use market_types::{CandidateSpec, DecisionId, Obligations, Provenance, RollbackContract};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Everything the codegen service needs to build a patch for a winner.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PatchBrief {
    pub decision_id: DecisionId,
    pub candidate_id: String,
    pub spec: CandidateSpec,
    pub provenance: Provenance,
    pub rollback: RollbackContract,
    pub obligations: Obligations,
    #[serde(default)]
    pub artifact: Value,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Queued,
    Running,
    Succeeded,
    Failed,
}

/// Receipt of a patch submission.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodegenTicket {
    pub ticket_id: String,
    pub status: TicketStatus,
    #[serde(default)]
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CodegenError {
    #[error("codegen service unavailable: {0}")]
    Unavailable(String),
    #[error("codegen service rejected patch brief: {0}")]
    Rejected(String),
}

impl CodegenError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unavailable(_) => "codegen.unavailable",
            Self::Rejected(_) => "codegen.rejected",
        }
    }
}

/// External code-generation service.
#[async_trait]
pub trait CodegenClient: Send + Sync {
    async fn submit(&self, brief: PatchBrief) -> Result<CodegenTicket, CodegenError>;
}

/// Records submissions and hands out queued `tkt-<n>` tickets.
#[derive(Default)]
pub struct SimulatedCodegenClient {
    next: AtomicU64,
    submissions: Mutex<Vec<PatchBrief>>,
    failure: Option<CodegenError>,
}

impl SimulatedCodegenClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(error: CodegenError) -> Self {
        Self {
            failure: Some(error),
            ..Self::default()
        }
    }

    /// Patch briefs received so far.
    pub fn submissions(&self) -> Vec<PatchBrief> {
        self.submissions
            .lock()
            .map(|s| s.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

#[async_trait]
impl CodegenClient for SimulatedCodegenClient {
    async fn submit(&self, brief: PatchBrief) -> Result<CodegenTicket, CodegenError> {
        if let Some(e) = &self.failure {
            return Err(e.clone());
        }
        let n = self.next.fetch_add(1, Ordering::SeqCst) + 1;
        let notes = vec![format!("candidate {}", brief.candidate_id)];
        self.submissions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(brief);
        Ok(CodegenTicket {
            ticket_id: format!("tkt-{}", n),
            status: TicketStatus::Queued,
            notes,
        })
    }
}
