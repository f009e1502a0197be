use crate::catalog::{model_label, StageCatalog};
use crate::cli::open_store;
use crate::github::prepare_settings;
use crate::state::PipelineState;
use crate::{Context, Result};
use anyhow::bail;
use clap::Args;
use colored::Colorize;
use dialoguer::Input;

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Project name (prompted for when omitted)
    #[arg(long)]
    pub project: Option<String>,

    /// Initial concept or problem statement (prompted for when omitted)
    #[arg(long)]
    pub concept: Option<String>,

    /// Preferred model (gpt-5-codex or gpt-5-pro)
    #[arg(long, default_value = "gpt-5-codex")]
    pub model: String,

    /// Git remote to push pipeline updates to
    #[arg(long)]
    pub github_remote: Option<String>,

    /// Branch to push when syncing with GitHub
    #[arg(long)]
    pub github_branch: Option<String>,

    /// Target base branch for the pull request (default: main)
    #[arg(long)]
    pub github_base: Option<String>,

    /// Automatically commit and push after each stage transition
    #[arg(long)]
    pub github_auto_sync: bool,

    /// Overwrite existing state
    #[arg(long)]
    pub force: bool,
}

pub fn run(catalog: &StageCatalog, args: &InitArgs) -> Result<()> {
    let store = open_store()?;
    if store.exists() && !args.force {
        bail!("Pipeline already initialized. Use --force to overwrite.");
    }

    // Reject unsupported model ids before anything is written.
    let label = model_label(&args.model)?;

    let project_name = match &args.project {
        Some(name) => name.clone(),
        None => Input::new().with_prompt("Project name").interact_text()?,
    };
    let concept = match &args.concept {
        Some(concept) => concept.clone(),
        None => Input::new()
            .with_prompt("Initial concept or problem statement")
            .interact_text()?,
    };

    let wants_github = args.github_auto_sync
        || args.github_remote.is_some()
        || args.github_branch.is_some()
        || args.github_base.is_some();
    let github = if wants_github {
        Some(
            prepare_settings(
                store.root(),
                args.github_remote.as_deref(),
                args.github_branch.as_deref(),
                args.github_base.as_deref(),
                args.github_auto_sync,
            )
            .context("failed to configure GitHub integration")?,
        )
    } else {
        None
    };

    let mut state = PipelineState::new(&project_name, &concept, &args.model, catalog);
    state.github = github;
    store.save(&state)?;

    println!(
        "{}",
        format!("Initialized pipeline for '{project_name}' using model {label}.").green()
    );
    if let Some(settings) = &state.github {
        if settings.auto_sync {
            println!(
                "GitHub auto-sync enabled for {}/{} -> {}.",
                settings.remote, settings.branch, settings.base
            );
        } else {
            println!(
                "GitHub repository metadata captured. Run 'stagecraft github configure --auto-sync' \
when you are ready to push after each stage."
            );
        }
    }
    Ok(())
}
