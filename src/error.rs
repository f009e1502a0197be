//! Error taxonomy for the pipeline state machine.
//!
//! Every gating failure carries enough detail for the CLI to print a targeted
//! message: ordering violations list the blocking stages, readiness violations
//! list the unmet checklist items.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// Construction-time guard against repeated catalog keys.
    #[error("stage '{0}' is already registered")]
    DuplicateStage(String),

    #[error("unknown stage '{0}'")]
    UnknownStage(String),

    #[error("stage '{stage}' has no checklist item '{item}'")]
    UnknownChecklistItem { stage: String, item: String },

    #[error("cannot advance stage '{}' until these stages are complete: {}", .stage, .blockers.join(", "))]
    OutOfOrder { stage: String, blockers: Vec<String> },

    #[error("stage '{}' readiness checklist has unmet items: {}", .stage, .remaining.join("; "))]
    ReadinessIncomplete { stage: String, remaining: Vec<String> },

    #[error("invalid status '{0}' (expected one of: pending, in_progress, complete)")]
    InvalidStatus(String),

    /// Direct assignment of `complete` is closed off; only `mark_complete`
    /// runs the ordering and readiness gates.
    #[error("status 'complete' can only be reached through mark_complete")]
    GatedStatus,

    #[error("unsupported model '{0}'")]
    UnsupportedModel(String),

    #[error("pipeline not initialized; run 'stagecraft init' first")]
    NotInitialized,

    #[error("persisted state is invalid: {0}")]
    InvalidPersistedState(String),
}

impl PipelineError {
    /// Stable process exit code for each failure kind, used at the CLI
    /// boundary. Gate failures are distinct from usage errors so scripts can
    /// tell "fix the workflow" apart from "fix the invocation".
    pub fn exit_code(&self) -> i32 {
        match self {
            PipelineError::OutOfOrder { .. } | PipelineError::ReadinessIncomplete { .. } => 3,
            PipelineError::NotInitialized => 4,
            PipelineError::InvalidPersistedState(_) => 5,
            _ => 2,
        }
    }
}
