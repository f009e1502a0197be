//! On-disk persistence for the pipeline record.
//!
//! One JSON file per project under `.stagecraft/`; its existence is the sole
//! "initialized" signal. Every save rewrites the whole record, so the file is
//! always self-consistent even if an invocation is interrupted beforehand.

use crate::catalog::StageCatalog;
use crate::error::PipelineError;
use crate::state::PipelineState;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

pub const STATE_DIR: &str = ".stagecraft";
pub const STATE_FILE: &str = "state.json";

/// Handles reading and writing pipeline state for one project root.
#[derive(Debug, Clone)]
pub struct StateStore {
    root: PathBuf,
    state_path: PathBuf,
}

impl StateStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let state_path = root.join(STATE_DIR).join(STATE_FILE);
        Self { root, state_path }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn state_path(&self) -> &Path {
        &self.state_path
    }

    pub fn exists(&self) -> bool {
        self.state_path.exists()
    }

    pub fn ensure_initialized(&self) -> Result<(), PipelineError> {
        if self.exists() {
            Ok(())
        } else {
            Err(PipelineError::NotInitialized)
        }
    }

    /// Load and validate the persisted record.
    ///
    /// Unknown stage keys are a hard failure; unknown checklist-item values
    /// were already coerced to `todo` during deserialization.
    pub fn load(&self, catalog: &StageCatalog) -> Result<PipelineState, PipelineError> {
        self.ensure_initialized()?;
        let content = std::fs::read_to_string(&self.state_path).map_err(|err| {
            PipelineError::InvalidPersistedState(format!("failed to read state file: {err}"))
        })?;
        let state: PipelineState = serde_json::from_str(&content)
            .map_err(|err| PipelineError::InvalidPersistedState(err.to_string()))?;
        state.validate(catalog)?;
        Ok(state)
    }

    /// Whole-record rewrite, creating the state directory as needed.
    pub fn save(&self, state: &PipelineState) -> Result<()> {
        let state_dir = self.root.join(STATE_DIR);
        std::fs::create_dir_all(&state_dir)
            .with_context(|| format!("failed to create {}", state_dir.display()))?;
        let content = serde_json::to_string_pretty(state).context("failed to serialize state")?;
        std::fs::write(&self.state_path, content)
            .with_context(|| format!("failed to write {}", self.state_path.display()))?;
        Ok(())
    }

    /// Delete the persisted record entirely.
    pub fn reset(&self) -> Result<()> {
        self.ensure_initialized()?;
        std::fs::remove_file(&self.state_path)
            .with_context(|| format!("failed to remove {}", self.state_path.display()))?;
        Ok(())
    }
}
