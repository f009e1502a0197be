//! CLI command implementations, one module per subcommand.
//!
//! This layer translates each failure kind from the state machine into a
//! targeted user-facing message; the core never prints.

pub mod capture;
pub mod check;
pub mod complete;
pub mod github;
pub mod init;
pub mod note;
pub mod prompt;
pub mod ready;
pub mod reset;
pub mod set_status;
pub mod status;
pub mod trace;

use crate::catalog::StageCatalog;
use crate::state::{PipelineState, StageStatus, StateStore};
use crate::Result;

/// Store rooted at the current working directory.
pub(crate) fn open_store() -> Result<StateStore> {
    Ok(StateStore::new(std::env::current_dir()?))
}

pub(crate) fn print_header(text: &str) {
    println!("\n=== {text} ===");
}

pub(crate) fn status_icon(status: StageStatus) -> &'static str {
    match status {
        StageStatus::Pending => "⏳",
        StageStatus::InProgress => "🔄",
        StageStatus::Complete => "✅",
    }
}

/// Run the GitHub auto-sync after a persisted stage transition and record a
/// sync note on the stage. Saves again only when something changed.
pub(crate) async fn sync_after_transition(
    store: &StateStore,
    catalog: &StageCatalog,
    state: &mut PipelineState,
    stage_key: &str,
) -> Result<()> {
    let stage = catalog.get(stage_key)?;
    let outcome = crate::github::auto_sync_stage(
        store.root(),
        state,
        catalog,
        &stage.key,
        &stage.title,
        stage.artifact_path.as_deref(),
        store.state_path(),
    )
    .await;

    for message in &outcome.messages {
        println!("{message}");
    }

    let mut note_updated = false;
    if let Some(sha) = &outcome.commit_sha {
        let mut sync_note = format!("GitHub sync commit {}", &sha[..7.min(sha.len())]);
        if let Some(pr) = outcome.pr_number {
            sync_note.push_str(&format!(" (PR #{pr})"));
        }
        let existing = state.stage_notes.get(stage_key).cloned().unwrap_or_default();
        if !existing.contains(&sync_note) {
            let combined = if existing.is_empty() {
                sync_note
            } else {
                format!("{existing}; {sync_note}")
            };
            state.stage_notes.insert(stage_key.to_string(), combined);
            note_updated = true;
        }
    }

    if outcome.state_updated || note_updated {
        store.save(state)?;
    }
    Ok(())
}
