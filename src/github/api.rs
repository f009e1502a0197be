//! Minimal GitHub REST client for pull-request management and feedback.

use super::GitError;
use reqwest::header::{ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

const API_ROOT: &str = "https://api.github.com";

/// Environment variables consulted for the API token, in order.
pub const TOKEN_ENV_VARS: &[&str] = &["STAGECRAFT_GITHUB_TOKEN", "GITHUB_TOKEN"];

pub fn github_token() -> Option<String> {
    TOKEN_ENV_VARS
        .iter()
        .find_map(|var| std::env::var(var).ok().filter(|v| !v.is_empty()))
}

#[derive(Debug, Clone, Deserialize)]
pub struct PullRequest {
    pub number: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Review {
    #[serde(default)]
    pub user: Option<Reviewer>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub submitted_at: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Reviewer {
    pub login: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckRun {
    pub name: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub conclusion: Option<String>,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub completed_at: Option<String>,
    #[serde(default)]
    pub details_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowRun {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub conclusion: Option<String>,
    pub run_number: u64,
    #[serde(default)]
    pub html_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CheckRunsResponse {
    #[serde(default)]
    check_runs: Vec<CheckRun>,
}

#[derive(Debug, Deserialize)]
struct WorkflowRunsResponse {
    #[serde(default)]
    workflow_runs: Vec<WorkflowRun>,
}

/// Authenticated client scoped to one `owner/name` repository.
pub struct GitHubClient {
    http: Client,
    token: String,
    repo_base: String,
}

impl GitHubClient {
    pub fn new(token: impl Into<String>, repository: &str) -> Self {
        Self {
            http: Client::new(),
            token: token.into(),
            repo_base: format!("{API_ROOT}/repos/{repository}"),
        }
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<T, GitError> {
        let url = format!("{}{path}", self.repo_base);
        let mut builder = self
            .http
            .request(method, &url)
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .header(ACCEPT, "application/vnd.github+json")
            .header(USER_AGENT, "stagecraft");
        if let Some(body) = body {
            builder = builder.json(&body);
        }
        let response = builder
            .send()
            .await
            .map_err(|err| GitError::Api(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(GitError::Api(format!("{status} {}", detail.trim())));
        }
        response
            .json::<T>()
            .await
            .map_err(|err| GitError::Api(err.to_string()))
    }

    pub async fn update_pr_body(&self, number: u64, body: &str) -> Result<(), GitError> {
        let _: PullRequest = self
            .request(
                Method::PATCH,
                &format!("/pulls/{number}"),
                Some(json!({ "body": body })),
            )
            .await?;
        Ok(())
    }

    /// First open pull request for the branch, if any.
    pub async fn find_open_pr(
        &self,
        owner: &str,
        branch: &str,
    ) -> Result<Option<u64>, GitError> {
        let open: Vec<PullRequest> = self
            .request(
                Method::GET,
                &format!("/pulls?head={owner}:{branch}&state=open"),
                None,
            )
            .await?;
        Ok(open.first().map(|pr| pr.number))
    }

    pub async fn create_draft_pr(
        &self,
        title: &str,
        head: &str,
        base: &str,
        body: &str,
    ) -> Result<u64, GitError> {
        let created: PullRequest = self
            .request(
                Method::POST,
                "/pulls",
                Some(json!({
                    "title": title,
                    "head": head,
                    "base": base,
                    "body": body,
                    "draft": true,
                })),
            )
            .await?;
        Ok(created.number)
    }

    pub async fn pr_reviews(&self, number: u64) -> Result<Vec<Review>, GitError> {
        self.request(Method::GET, &format!("/pulls/{number}/reviews"), None)
            .await
    }

    pub async fn check_runs(&self, sha: &str) -> Result<Vec<CheckRun>, GitError> {
        let response: CheckRunsResponse = self
            .request(Method::GET, &format!("/commits/{sha}/check-runs"), None)
            .await?;
        Ok(response.check_runs)
    }

    pub async fn workflow_runs(&self, branch: &str) -> Result<Vec<WorkflowRun>, GitError> {
        let response: WorkflowRunsResponse = self
            .request(
                Method::GET,
                &format!("/actions/runs?branch={branch}&per_page=5"),
                None,
            )
            .await?;
        Ok(response.workflow_runs)
    }
}
