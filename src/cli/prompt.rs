use crate::catalog::{model_label, PromptContext, StageCatalog};
use crate::cli::{open_store, print_header};
use crate::Result;
use colored::Colorize;

pub fn run(catalog: &StageCatalog, stage_key: &str) -> Result<()> {
    let store = open_store()?;
    let mut state = store.load(catalog)?;
    let stage = catalog.get(stage_key)?;
    let label = model_label(&state.model)?;

    // Cloned so the context stays usable while the checklist is normalized.
    let project_name = state.project_name.clone();
    let concept = state.concept.clone();
    let ctx = PromptContext {
        project_name: &project_name,
        model_label: label,
        concept: &concept,
    };

    print_header(&stage.title);
    println!("{}", stage.render_description(&ctx));

    print_header("Instructions");
    println!("{}", stage.render_instructions(&ctx));

    if stage.ready_checklist.is_some() {
        print_header("Ready Checklist");
        let ready = state.get_ready_status(catalog, stage_key)?;
        for item in stage.checklist() {
            let icon = match ready.get(item) {
                Some(crate::state::ReadyItemStatus::Pass) => "✅".to_string(),
                _ => "⬜".to_string(),
            };
            println!("{icon} {item}");
        }
    }

    if let Some(system_prompt) = stage.render_system_prompt(&ctx) {
        print_header("System Prompt");
        println!("{system_prompt}");
    }

    if let Some(kickoff_prompt) = stage.render_kickoff_prompt(&ctx) {
        print_header("Kickoff Prompt");
        println!("{kickoff_prompt}");
    }

    if let Some(artifact) = &stage.artifact_path {
        println!();
        println!(
            "{}",
            format!("Capture the approved artifact with 'stagecraft capture {stage_key}' (stored at {artifact}).")
                .bright_black()
        );
    }
    Ok(())
}
