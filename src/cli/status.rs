use crate::catalog::{model_label, StageCatalog};
use crate::cli::{open_store, print_header, status_icon};
use crate::Result;
use colored::Colorize;

pub fn run(catalog: &StageCatalog) -> Result<()> {
    let store = open_store()?;
    let mut state = store.load(catalog)?;

    let label = match model_label(&state.model) {
        Ok(label) => label.to_string(),
        // Tolerate drifted model ids in the record; status is read-only.
        Err(_) => state.model.clone(),
    };

    println!("Project: {}", state.project_name.bold());
    println!("Model:   {label}");
    println!("Concept: {}", state.concept);

    if let Some(settings) = &state.github {
        print_header("GitHub Sync");
        let repo_label = settings.repository.as_deref().unwrap_or("(unknown repository)");
        println!("Remote: {} -> {repo_label}", settings.remote);
        println!("Branch: {} (base {})", settings.branch, settings.base);
        println!(
            "Auto-sync: {}",
            if settings.auto_sync { "enabled".green() } else { "disabled".yellow() }
        );
        if let Some(pr) = settings.pr_number {
            println!("Pull request: #{pr}");
        }
    }

    print_header("Stage Progress");
    let rows: Vec<(String, crate::state::StageStatus)> = state
        .list_statuses(catalog)
        .map(|(key, status)| (key.to_string(), status))
        .collect();
    for (key, status) in rows {
        let stage = catalog.get(&key)?;
        println!("{} {} ({key}) -> {status}", status_icon(status), stage.title);

        if stage.ready_checklist.is_some() {
            let ready = state.get_ready_status(catalog, &key)?;
            let passed = ready
                .values()
                .filter(|s| **s == crate::state::ReadyItemStatus::Pass)
                .count();
            println!("    Ready checklist: {passed}/{} passed", ready.len());
        }
        if let Some(note) = state.stage_notes.get(&key) {
            println!("    Note: {note}");
        }
    }
    Ok(())
}
