// Stagecraft - staged, LLM-assisted delivery workflow coordinator
// Fixed stage ordering, per-stage readiness gates, and GitHub sync

pub mod catalog;
pub mod checker;
pub mod cli;
pub mod error;
pub mod github;
pub mod state;

pub use anyhow::{Context, Result};
pub use colored::Colorize;

// Re-export commonly used types
pub use catalog::{Stage, StageCatalog};
pub use error::PipelineError;
pub use state::{PipelineState, StageStatus, StateStore};
