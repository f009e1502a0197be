use crate::catalog::StageCatalog;
use crate::cli::{open_store, print_header};
use crate::github::{fetch_feedback, prepare_settings};
use crate::Result;
use anyhow::bail;
use clap::{Args, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

#[derive(Debug, Subcommand)]
pub enum GithubCommand {
    /// Configure GitHub sync settings
    Configure(ConfigureArgs),

    /// Fetch review and workflow status for the tracked pull request
    Feedback(FeedbackArgs),
}

#[derive(Debug, Args)]
pub struct ConfigureArgs {
    /// Git remote to push to
    #[arg(long)]
    pub remote: Option<String>,

    /// Branch name to push
    #[arg(long)]
    pub branch: Option<String>,

    /// Target base branch for pull requests
    #[arg(long)]
    pub base: Option<String>,

    /// Enable automatic commit and push after each stage
    #[arg(long, conflicts_with = "no_auto_sync")]
    pub auto_sync: bool,

    /// Disable automatic commit and push
    #[arg(long)]
    pub no_auto_sync: bool,
}

#[derive(Debug, Args)]
pub struct FeedbackArgs {
    /// Commit SHA to inspect (defaults to HEAD)
    #[arg(long)]
    pub commit: Option<String>,

    /// Maximum number of recent reviews to display
    #[arg(long, default_value_t = 5)]
    pub max_reviews: usize,
}

pub async fn run(catalog: &StageCatalog, command: &GithubCommand) -> Result<()> {
    match command {
        GithubCommand::Configure(args) => configure(catalog, args),
        GithubCommand::Feedback(args) => feedback(catalog, args).await,
    }
}

fn configure(catalog: &StageCatalog, args: &ConfigureArgs) -> Result<()> {
    let store = open_store()?;
    let mut state = store.load(catalog)?;
    let current = state.github.clone();

    let desired_remote = args
        .remote
        .clone()
        .or_else(|| current.as_ref().map(|c| c.remote.clone()));
    let desired_branch = args
        .branch
        .clone()
        .or_else(|| current.as_ref().map(|c| c.branch.clone()));
    let desired_base = args
        .base
        .clone()
        .or_else(|| current.as_ref().map(|c| c.base.clone()));
    let desired_auto = if args.auto_sync {
        true
    } else if args.no_auto_sync {
        false
    } else {
        current.as_ref().map(|c| c.auto_sync).unwrap_or(false)
    };

    let mut settings = prepare_settings(
        store.root(),
        desired_remote.as_deref(),
        desired_branch.as_deref(),
        desired_base.as_deref(),
        desired_auto,
    )?;

    // Once set, the PR link and repository slug survive reconfiguration.
    if let Some(current) = &current {
        if settings.pr_number.is_none() {
            settings.pr_number = current.pr_number;
        }
        if settings.repository.is_none() {
            settings.repository = current.repository.clone();
        }
    }

    state.github = Some(settings.clone());
    store.save(&state)?;

    let status = if settings.auto_sync { "enabled" } else { "disabled" };
    println!(
        "{}",
        format!(
            "GitHub sync configured for {}/{} -> {} ({status}).",
            settings.remote, settings.branch, settings.base
        )
        .green()
    );
    if settings.auto_sync {
        println!("Future stage completions will commit, push, and update the tracked pull request automatically.");
    } else {
        println!("Automatic syncing is disabled. Re-run with --auto-sync to enable push-and-review automation.");
    }
    Ok(())
}

async fn feedback(catalog: &StageCatalog, args: &FeedbackArgs) -> Result<()> {
    let store = open_store()?;
    let mut state = store.load(catalog)?;
    let Some(settings) = state.github.as_mut() else {
        bail!(
            "GitHub integration is not configured. Run 'stagecraft github configure --auto-sync' \
after setting up your git repository."
        );
    };

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .expect("static template"),
    );
    spinner.set_message("Fetching GitHub feedback...");
    spinner.enable_steady_tick(Duration::from_millis(100));

    let result = fetch_feedback(
        store.root(),
        settings,
        args.commit.as_deref(),
        args.max_reviews,
    )
    .await;
    spinner.finish_and_clear();
    let data = result?;

    if data.repository_updated {
        store.save(&state)?;
    }

    print_header("Commit");
    println!("Inspecting commit: {}", data.commit);

    print_header("Check Runs");
    if data.check_runs.is_empty() {
        println!("No check runs reported yet.");
    } else {
        for check in &data.check_runs {
            let conclusion = check
                .conclusion
                .as_deref()
                .or(check.status.as_deref())
                .unwrap_or("unknown");
            let updated = check
                .completed_at
                .as_deref()
                .or(check.started_at.as_deref())
                .unwrap_or("");
            let mut line = format!("- {}: {conclusion}", check.name);
            if !updated.is_empty() {
                line.push_str(&format!(" (updated {updated})"));
            }
            println!("{line}");
            if let Some(url) = &check.details_url {
                println!("  {url}");
            }
        }
    }

    print_header("Workflow Runs");
    if data.workflow_runs.is_empty() {
        println!("No workflow runs found for the tracked branch.");
    } else {
        for run in &data.workflow_runs {
            let name = run.name.as_deref().unwrap_or("Workflow");
            let status = run.status.as_deref().unwrap_or("unknown");
            let mut line = format!("- {name} #{}: {status}", run.run_number);
            if let Some(conclusion) = &run.conclusion {
                line.push_str(&format!(" -> {conclusion}"));
            }
            println!("{line}");
            if let Some(url) = &run.html_url {
                println!("  {url}");
            }
        }
    }

    print_header("Recent Reviews");
    if data.reviews.is_empty() {
        println!("No pull request reviews have been submitted yet.");
    } else {
        for review in &data.reviews {
            let user = review
                .user
                .as_ref()
                .map(|u| u.login.as_str())
                .unwrap_or("unknown");
            let review_state = review.state.as_deref().unwrap_or("unknown");
            let submitted = review.submitted_at.as_deref().unwrap_or("");
            println!("- {user}: {review_state} at {submitted}");
            if let Some(body) = &review.body {
                if !body.trim().is_empty() {
                    println!("  {}", body.trim());
                }
            }
        }
    }
    Ok(())
}
