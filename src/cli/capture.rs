use crate::catalog::StageCatalog;
use crate::cli::{open_store, sync_after_transition};
use crate::state::{PipelineState, StateStore};
use crate::{Context, Result};
use anyhow::bail;
use colored::Colorize;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

pub async fn run(
    catalog: &StageCatalog,
    stage_key: &str,
    file: Option<&Path>,
    append: bool,
) -> Result<()> {
    let store = open_store()?;
    let mut state = store.load(catalog)?;
    let stage = catalog.get(stage_key)?;

    if stage.artifact_path.is_none() {
        bail!(
            "Stage '{stage_key}' does not produce an artifact. Use the 'complete' command instead."
        );
    }

    // Both gates run before content is read or written, so a blocked
    // capture prompts for nothing and touches no files.
    state.ensure_order(catalog, stage_key)?;
    state.ensure_ready(catalog, stage_key)?;

    let content = read_capture_content(file)?;
    let artifact_rel = save_artifact(&store, catalog, &mut state, stage_key, &content, append)?;
    println!(
        "{}",
        format!("Saved artifact to {artifact_rel} and marked stage complete.").green()
    );

    sync_after_transition(&store, catalog, &mut state, stage_key).await
}

/// Gate, write the artifact, mark the stage complete, and persist. Returns
/// the artifact's relative path. Nothing is written when a gate fails.
fn save_artifact(
    store: &StateStore,
    catalog: &StageCatalog,
    state: &mut PipelineState,
    stage_key: &str,
    content: &str,
    append: bool,
) -> Result<String> {
    let stage = catalog.get(stage_key)?;
    let Some(artifact_rel) = stage.artifact_path.clone() else {
        bail!("Stage '{stage_key}' does not produce an artifact.");
    };

    state.ensure_order(catalog, stage_key)?;
    state.ensure_ready(catalog, stage_key)?;

    let artifact_path = store.root().join(&artifact_rel);
    if let Some(parent) = artifact_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    if append {
        let mut handle = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&artifact_path)
            .with_context(|| format!("failed to open {}", artifact_path.display()))?;
        handle.write_all(content.as_bytes())?;
        if !content.ends_with('\n') {
            handle.write_all(b"\n")?;
        }
    } else {
        std::fs::write(&artifact_path, content)
            .with_context(|| format!("failed to write {}", artifact_path.display()))?;
    }

    state.mark_complete(catalog, stage_key)?;
    state
        .stage_notes
        .insert(stage_key.to_string(), format!("Artifact saved to {artifact_rel}"));
    store.save(state)?;
    Ok(artifact_rel)
}

fn read_capture_content(file: Option<&Path>) -> Result<String> {
    if let Some(path) = file {
        let path: PathBuf = path.to_path_buf();
        return std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()));
    }

    println!("Paste the artifact content. End input with a line containing only 'EOF'.");
    let stdin = std::io::stdin();
    let mut lines = Vec::new();
    for line in stdin.lock().lines() {
        let line = line.context("failed to read stdin")?;
        if line.trim() == "EOF" {
            break;
        }
        lines.push(line);
    }
    let content = lines.join("\n").trim_end().to_string();
    if content.is_empty() {
        bail!("No content captured. Aborting.");
    }
    Ok(content + "\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::test_stage;
    use crate::error::PipelineError;
    use crate::state::{ReadyItemStatus, StageStatus};
    use tempfile::TempDir;

    fn setup() -> (TempDir, StateStore, StageCatalog, PipelineState) {
        let temp = TempDir::new().unwrap();
        let store = StateStore::new(temp.path());
        let mut catalog = StageCatalog::new();
        catalog
            .register(test_stage(
                "doc",
                Some(&["approved"]),
                Some("artifacts/doc.md"),
            ))
            .unwrap();
        let state = PipelineState::new("demo", "c", "gpt-5-codex", &catalog);
        store.save(&state).unwrap();
        (temp, store, catalog, state)
    }

    #[test]
    fn test_readiness_blocked_capture_writes_nothing() {
        let (temp, store, catalog, mut state) = setup();

        let err = save_artifact(&store, &catalog, &mut state, "doc", "content\n", false)
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::ReadinessIncomplete { .. })
        ));

        // Neither the artifact nor its directory exists after the failure.
        assert!(!temp.path().join("artifacts/doc.md").exists());
        assert!(!temp.path().join("artifacts").exists());
        assert_eq!(state.get_status("doc"), StageStatus::Pending);
    }

    #[test]
    fn test_ready_capture_writes_and_completes() {
        let (temp, store, catalog, mut state) = setup();
        state
            .update_ready_item(&catalog, "doc", "approved", ReadyItemStatus::Pass)
            .unwrap();

        let rel = save_artifact(&store, &catalog, &mut state, "doc", "content\n", false)
            .unwrap();
        assert_eq!(rel, "artifacts/doc.md");
        assert_eq!(
            std::fs::read_to_string(temp.path().join("artifacts/doc.md")).unwrap(),
            "content\n"
        );
        assert_eq!(state.get_status("doc"), StageStatus::Complete);

        // The persisted record carries the completion and the note.
        let reloaded = store.load(&catalog).unwrap();
        assert_eq!(reloaded.get_status("doc"), StageStatus::Complete);
        assert_eq!(reloaded.stage_notes["doc"], "Artifact saved to artifacts/doc.md");
    }

    #[test]
    fn test_append_adds_to_existing_artifact() {
        let (temp, store, catalog, mut state) = setup();
        state
            .update_ready_item(&catalog, "doc", "approved", ReadyItemStatus::Pass)
            .unwrap();

        save_artifact(&store, &catalog, &mut state, "doc", "first\n", false).unwrap();
        save_artifact(&store, &catalog, &mut state, "doc", "second", true).unwrap();
        assert_eq!(
            std::fs::read_to_string(temp.path().join("artifacts/doc.md")).unwrap(),
            "first\nsecond\n"
        );
    }
}
