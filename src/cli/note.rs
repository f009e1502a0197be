use crate::catalog::StageCatalog;
use crate::cli::open_store;
use crate::Result;
use colored::Colorize;

/// Attach a free-text note to a stage, independent of its status.
pub fn run(catalog: &StageCatalog, stage_key: &str, text: &str) -> Result<()> {
    let store = open_store()?;
    let mut state = store.load(catalog)?;
    catalog.get(stage_key)?;

    state
        .stage_notes
        .insert(stage_key.to_string(), text.to_string());
    store.save(&state)?;
    println!("{}", format!("Note recorded for '{stage_key}'.").green());
    Ok(())
}
