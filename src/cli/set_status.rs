use crate::catalog::StageCatalog;
use crate::cli::open_store;
use crate::state::StageStatus;
use crate::Result;
use colored::Colorize;

/// Ungated `pending`/`in_progress` transition; `complete` is rejected by the
/// core so the gates in `mark_complete` cannot be bypassed.
pub fn run(catalog: &StageCatalog, stage_key: &str, status: &str) -> Result<()> {
    let store = open_store()?;
    let mut state = store.load(catalog)?;

    let status: StageStatus = status.parse()?;
    state.set_status(catalog, stage_key, status)?;
    store.save(&state)?;

    println!(
        "{}",
        format!("Stage '{stage_key}' set to {status}.").green()
    );
    Ok(())
}
