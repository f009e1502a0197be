use crate::catalog::StageCatalog;
use crate::cli::open_store;
use crate::error::PipelineError;
use crate::state::{PipelineState, ReadyItemStatus};
use crate::Result;
use clap::Subcommand;
use colored::Colorize;

#[derive(Debug, Subcommand)]
pub enum ReadyCommand {
    /// Show the readiness checklist for a stage
    Show { stage: String },

    /// Set one checklist item to todo or pass
    Set {
        stage: String,
        /// Checklist item: 1-based index or exact label
        item: String,
        /// New status: todo or pass
        status: String,
    },

    /// Reset every checklist item for a stage back to todo
    Reset { stage: String },
}

pub fn run(catalog: &StageCatalog, command: &ReadyCommand) -> Result<()> {
    let store = open_store()?;
    let mut state = store.load(catalog)?;

    match command {
        ReadyCommand::Show { stage } => {
            show(catalog, &mut state, stage)?;
            // Showing normalizes the stored map; persist the healed record.
            store.save(&state)?;
        }
        ReadyCommand::Set {
            stage,
            item,
            status,
        } => {
            let status: ReadyItemStatus = status.parse()?;
            let label = resolve_item(catalog, stage, item)?;
            state.update_ready_item(catalog, stage, &label, status)?;
            store.save(&state)?;
            println!("{}", format!("'{label}' set to {status}.").green());
            if state.is_ready_complete(catalog, stage)? {
                println!(
                    "{}",
                    format!("Stage '{stage}' readiness checklist is fully passed.").green()
                );
            }
        }
        ReadyCommand::Reset { stage } => {
            state.reset_ready(catalog, stage)?;
            store.save(&state)?;
            println!("{}", format!("Checklist for '{stage}' reset to todo.").yellow());
        }
    }
    Ok(())
}

fn show(catalog: &StageCatalog, state: &mut PipelineState, stage_key: &str) -> Result<()> {
    let stage = catalog.get(stage_key)?;
    let ready = state.get_ready_status(catalog, stage_key)?;
    if ready.is_empty() {
        println!("Stage '{stage_key}' has no readiness checklist; it is always ready.");
        return Ok(());
    }
    println!("{}", format!("Readiness checklist for '{}':", stage.title).bold());
    for (index, item) in stage.checklist().iter().enumerate() {
        let icon = match ready.get(item) {
            Some(ReadyItemStatus::Pass) => "✅",
            _ => "⬜",
        };
        println!("{icon} {}. {item}", index + 1);
    }
    Ok(())
}

/// Accept either a 1-based index into the declared checklist or the exact
/// item label. Index resolution is CLI sugar; the core only knows labels.
fn resolve_item(catalog: &StageCatalog, stage_key: &str, item: &str) -> Result<String> {
    let stage = catalog.get(stage_key)?;
    let checklist = stage.checklist();
    if let Ok(index) = item.parse::<usize>() {
        if index >= 1 && index <= checklist.len() {
            return Ok(checklist[index - 1].clone());
        }
        return Err(PipelineError::UnknownChecklistItem {
            stage: stage_key.to_string(),
            item: item.to_string(),
        }
        .into());
    }
    Ok(item.to_string())
}
