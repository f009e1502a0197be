//! Git and GitHub integration for syncing pipeline progress.
//!
//! Invoked by the CLI after a stage transition has already been persisted, so
//! a sync failure can never corrupt or block a state-machine operation. The
//! commit/push side effect is irreversible; a later pull-request failure is
//! reported as a partial outcome rather than retried blindly.

pub mod api;
pub mod git;

use crate::catalog::StageCatalog;
use crate::state::{GitHubSettings, PipelineState};
use api::{github_token, GitHubClient};
use chrono::Utc;
use git::GitWorkspace;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GitError {
    #[error("not inside a git repository; initialize git before enabling GitHub sync")]
    NotARepository,

    #[error("no git remotes configured; add a GitHub remote first")]
    NoRemotes,

    #[error("remote '{0}' not found")]
    UnknownRemote(String),

    #[error("cannot determine branch in detached HEAD state")]
    DetachedHead,

    #[error("cannot auto-sync while other files are staged; commit or unstage them first")]
    DirtyIndex,

    #[error("path '{}' is outside the repository root and cannot be staged", .0.display())]
    OutsideRepository(PathBuf),

    #[error("remote does not point to GitHub; provide a GitHub remote for auto-sync")]
    NotGitHubRemote,

    #[error("unable to parse GitHub repository owner/name from remote URL")]
    MalformedRemote,

    #[error("no pull request is associated with this pipeline yet; run an auto-sync first")]
    NoPullRequest,

    #[error(
        "GitHub token not configured; set STAGECRAFT_GITHUB_TOKEN or GITHUB_TOKEN to fetch feedback"
    )]
    MissingToken,

    #[error("GitHub API request failed: {0}")]
    Api(String),

    #[error("git push failed: {0}")]
    PushFailed(String),

    #[error(transparent)]
    Git(#[from] git2::Error),
}

/// Outcome of a GitHub auto-sync attempt. Messages are user-facing lines the
/// CLI prints verbatim; `state_updated` tells the caller to persist the state
/// again because `repository`/`pr_number` changed.
#[derive(Debug, Default)]
pub struct SyncOutcome {
    pub commit_sha: Option<String>,
    pub pr_number: Option<u64>,
    pub state_updated: bool,
    pub messages: Vec<String>,
}

/// Feedback gathered for the tracked pull request and branch.
#[derive(Debug)]
pub struct Feedback {
    pub commit: String,
    pub reviews: Vec<api::Review>,
    pub check_runs: Vec<api::CheckRun>,
    pub workflow_runs: Vec<api::WorkflowRun>,
    pub repository: String,
    pub repository_updated: bool,
}

/// Extract the `owner/name` slug from a GitHub remote URL.
pub fn parse_repository_slug(url: &str) -> Result<String, GitError> {
    let cleaned = url.trim().trim_end_matches(".git");
    let slug = if let Some(rest) = cleaned.strip_prefix("git@github.com:") {
        rest
    } else if let Some(rest) = cleaned.strip_prefix("https://github.com/") {
        rest
    } else if let Some(rest) = cleaned.strip_prefix("ssh://git@github.com/") {
        rest
    } else {
        return Err(GitError::NotGitHubRemote);
    };
    if slug.split('/').filter(|part| !part.is_empty()).count() < 2 {
        return Err(GitError::MalformedRemote);
    }
    Ok(slug.to_string())
}

/// Resolve git metadata for the project and build sync settings.
pub fn prepare_settings(
    root: &Path,
    remote: Option<&str>,
    branch: Option<&str>,
    base: Option<&str>,
    auto_sync: bool,
) -> Result<GitHubSettings, GitError> {
    let workspace = GitWorkspace::discover(root)?;
    let remotes = workspace.remotes()?;

    let resolved_remote = match remote {
        Some(name) => {
            if !remotes.iter().any(|r| r == name) {
                return Err(GitError::UnknownRemote(name.to_string()));
            }
            name.to_string()
        }
        None => workspace.default_remote()?,
    };

    let resolved_branch = match branch {
        Some(name) => name.to_string(),
        None => workspace.current_branch()?,
    };
    let resolved_base = base.unwrap_or("main").to_string();
    let repository = parse_repository_slug(&workspace.remote_url(&resolved_remote)?)?;

    Ok(GitHubSettings {
        remote: resolved_remote,
        branch: resolved_branch,
        base: resolved_base,
        auto_sync,
        repository: Some(repository),
        pr_number: None,
    })
}

/// Markdown progress table used as the pull-request body.
pub fn render_pr_body(state: &PipelineState, catalog: &StageCatalog) -> String {
    let mut lines = vec![
        format!("# Pipeline Progress: {}", state.project_name),
        String::new(),
        "| Stage | Status | Ready | Notes |".to_string(),
        "|-------|--------|-------|-------|".to_string(),
    ];
    for (key, status) in state.list_statuses(catalog) {
        let ready = match catalog.get(key) {
            Ok(stage) if stage.ready_checklist.is_some() => {
                let declared = stage.checklist().len();
                let passed = declared
                    - state
                        .remaining_ready_items(catalog, key)
                        .map(|r| r.len())
                        .unwrap_or(declared);
                format!("{passed}/{declared}")
            }
            _ => "n/a".to_string(),
        };
        let note = state
            .stage_notes
            .get(key)
            .map(|n| n.replace('|', "\\|"))
            .unwrap_or_default();
        lines.push(format!("| `{key}` | {status} | {ready} | {note} |"));
    }
    let timestamp = Utc::now().format("%Y-%m-%d %H:%M UTC");
    lines.push(String::new());
    lines.push(format!("_Last updated: {timestamp}_"));
    lines.join("\n")
}

fn ensure_repository(
    workspace: &GitWorkspace,
    settings: &mut GitHubSettings,
) -> Result<(String, bool), GitError> {
    if let Some(repository) = &settings.repository {
        return Ok((repository.clone(), false));
    }
    let repository = parse_repository_slug(&workspace.remote_url(&settings.remote)?)?;
    settings.repository = Some(repository.clone());
    Ok((repository, true))
}

async fn ensure_pull_request(
    workspace: &GitWorkspace,
    settings: &mut GitHubSettings,
    state: &PipelineState,
    catalog: &StageCatalog,
    messages: &mut Vec<String>,
) -> Result<Option<u64>, GitError> {
    let Some(token) = github_token() else {
        messages.push(
            "Skipped pull-request management because no GitHub token is configured. \
Set STAGECRAFT_GITHUB_TOKEN or GITHUB_TOKEN to enable automatic PR updates."
                .to_string(),
        );
        return Ok(settings.pr_number);
    };

    let (repository, _) = ensure_repository(workspace, settings)?;
    let client = GitHubClient::new(token, &repository);
    let body = render_pr_body(state, catalog);

    if let Some(number) = settings.pr_number {
        client.update_pr_body(number, &body).await?;
        messages.push(format!(
            "Updated pull request #{number} with the latest pipeline status."
        ));
        return Ok(Some(number));
    }

    let owner = repository
        .split('/')
        .next()
        .ok_or(GitError::MalformedRemote)?;
    if let Some(number) = client.find_open_pr(owner, &settings.branch).await? {
        client.update_pr_body(number, &body).await?;
        messages.push(format!(
            "Linked to existing pull request #{number} for branch {}.",
            settings.branch
        ));
        return Ok(Some(number));
    }

    let number = client
        .create_draft_pr(
            &format!("[Pipeline] {}", state.project_name),
            &settings.branch,
            &settings.base,
            &body,
        )
        .await?;
    messages.push(format!(
        "Opened draft pull request #{number} targeting {}. Review workflows can now run on each sync.",
        settings.base
    ));
    Ok(Some(number))
}

/// Commit the state file and stage artifact, push, and keep the tracked pull
/// request current. Never returns an error: every failure becomes a message
/// in the outcome, because the stage transition that triggered the sync has
/// already been persisted.
pub async fn auto_sync_stage(
    root: &Path,
    state: &mut PipelineState,
    catalog: &StageCatalog,
    stage_key: &str,
    stage_title: &str,
    artifact_path: Option<&str>,
    state_path: &Path,
) -> SyncOutcome {
    let mut outcome = SyncOutcome::default();
    let Some(mut settings) = state.github.clone() else {
        return outcome;
    };
    if !settings.auto_sync {
        return outcome;
    }

    let workspace = match GitWorkspace::discover(root) {
        Ok(ws) => ws,
        Err(err) => {
            outcome.messages.push(err.to_string());
            return outcome;
        }
    };

    let mut tracked = vec![state_path.to_path_buf()];
    if let Some(artifact) = artifact_path {
        let artifact = root.join(artifact);
        if artifact.exists() {
            tracked.push(artifact);
        }
    }

    let message = format!("pipeline({stage_key}): sync {stage_title}");
    let commit_sha = match workspace.commit_paths(&tracked, &message) {
        Ok(Some(sha)) => sha,
        Ok(None) => {
            outcome
                .messages
                .push("GitHub sync skipped because there were no changes for this step.".to_string());
            return outcome;
        }
        Err(err) => {
            outcome.messages.push(err.to_string());
            return outcome;
        }
    };

    if let Err(err) = workspace.push(&settings.remote, &settings.branch) {
        outcome.messages.push(err.to_string());
        return outcome;
    }

    outcome.commit_sha = Some(commit_sha.clone());
    outcome.messages.push(format!(
        "Pushed stage '{stage_title}' to {}/{} (commit {}).",
        settings.remote,
        settings.branch,
        &commit_sha[..7.min(commit_sha.len())]
    ));

    // The push already happened; PR failures from here on are partial
    // outcomes, and the settings update below is still attempted.
    match ensure_pull_request(&workspace, &mut settings, state, catalog, &mut outcome.messages)
        .await
    {
        Ok(Some(number)) => {
            settings.pr_number = Some(number);
            outcome.pr_number = Some(number);
        }
        Ok(None) => {}
        Err(err) => outcome.messages.push(err.to_string()),
    }

    if state.github.as_ref() != Some(&settings) {
        state.github = Some(settings);
        outcome.state_updated = true;
    }
    outcome
}

/// Retrieve review and check-run feedback for the tracked pull request.
pub async fn fetch_feedback(
    root: &Path,
    settings: &mut GitHubSettings,
    commit_sha: Option<&str>,
    max_reviews: usize,
) -> Result<Feedback, GitError> {
    let pr_number = settings.pr_number.ok_or(GitError::NoPullRequest)?;
    let token = github_token().ok_or(GitError::MissingToken)?;

    let workspace = GitWorkspace::discover(root)?;
    let (repository, repository_updated) = ensure_repository(&workspace, settings)?;
    let client = GitHubClient::new(token, &repository);

    let commit = match commit_sha {
        Some(sha) => sha.to_string(),
        None => workspace.head_sha()?,
    };

    let mut reviews = client.pr_reviews(pr_number).await?;
    if reviews.len() > max_reviews {
        reviews = reviews.split_off(reviews.len() - max_reviews);
    }
    let check_runs = client.check_runs(&commit).await?;
    let workflow_runs = client.workflow_runs(&settings.branch).await?;

    Ok(Feedback {
        commit,
        reviews,
        check_runs,
        workflow_runs,
        repository,
        repository_updated,
    })
}
