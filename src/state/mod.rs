//! Pipeline state management, including:
//! - Per-stage status and ordering gates
//! - Readiness-checklist progress and gating
//! - GitHub sync settings
//! - JSON persistence on local disk

mod pipeline;
mod store;

pub use pipeline::{
    normalize_ready, GitHubSettings, PipelineState, ReadyItemStatus, StageStatus,
};
pub use store::{StateStore, STATE_DIR, STATE_FILE};
