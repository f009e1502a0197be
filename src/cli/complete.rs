use crate::catalog::StageCatalog;
use crate::cli::{open_store, sync_after_transition};
use crate::Result;
use anyhow::bail;
use colored::Colorize;

pub async fn run(catalog: &StageCatalog, stage_key: &str, note: Option<&str>) -> Result<()> {
    let store = open_store()?;
    let mut state = store.load(catalog)?;
    let stage = catalog.get(stage_key)?;

    if let Some(artifact) = &stage.artifact_path {
        if !store.root().join(artifact).exists() {
            bail!(
                "Cannot complete this stage because its artifact is missing. Use the capture command first."
            );
        }
    }

    state.mark_complete(catalog, stage_key)?;
    if let Some(note) = note {
        state.stage_notes.insert(stage_key.to_string(), note.to_string());
    }
    store.save(&state)?;
    println!("{}", format!("Stage '{}' marked as complete.", stage.title).green());

    sync_after_transition(&store, catalog, &mut state, stage_key).await
}
