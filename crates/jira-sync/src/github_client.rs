//! GitHub API client for pull request comments and lookups.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::StatusCode;
use serde_json::json;
use std::fmt;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::error::{expect_status, ClientError};
use crate::models::{PullRequest, PullRequestCommit};

/// Public GitHub API root.
pub const GITHUB_API_URL: &str = "https://api.github.com";

const SERVICE: &str = "GitHub";

/// Source-host operations used by the webhook handlers.
#[async_trait]
pub trait SourceHost: Send + Sync {
    /// Post a comment on a pull request.
    async fn add_pr_comment(
        &self,
        owner: &str,
        repo: &str,
        pr_number: u64,
        text: &str,
    ) -> Result<(), ClientError>;

    /// Fetch a pull request.
    async fn get_pr(&self, owner: &str, repo: &str, pr_number: u64)
        -> Result<PullRequest, ClientError>;

    /// List the commits of a pull request.
    async fn get_pr_commits(
        &self,
        owner: &str,
        repo: &str,
        pr_number: u64,
    ) -> Result<Vec<PullRequestCommit>, ClientError>;
}

/// GitHub REST client authenticated with a token.
#[derive(Clone)]
pub struct GitHubClient {
    client: reqwest::Client,
    token: String,
    api_url: String,
}

impl fmt::Debug for GitHubClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitHubClient")
            .field("api_url", &self.api_url)
            .finish_non_exhaustive()
    }
}

impl GitHubClient {
    /// Create a new GitHub client against `api_url`
    /// (normally [`GITHUB_API_URL`]).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(token: &str, api_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static("jira-sync/1.0"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            token: token.to_string(),
            api_url: api_url.trim_end_matches('/').to_string(),
        })
    }

    fn pulls_url(&self, owner: &str, repo: &str, pr_number: u64) -> String {
        format!("{}/repos/{owner}/{repo}/pulls/{pr_number}", self.api_url)
    }
}

#[async_trait]
impl SourceHost for GitHubClient {
    #[instrument(skip(self, text))]
    async fn add_pr_comment(
        &self,
        owner: &str,
        repo: &str,
        pr_number: u64,
        text: &str,
    ) -> Result<(), ClientError> {
        // PR conversation comments live on the issues endpoint.
        let url = format!(
            "{}/repos/{owner}/{repo}/issues/{pr_number}/comments",
            self.api_url
        );

        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .json(&json!({ "body": text }))
            .send()
            .await?;

        expect_status(SERVICE, response, StatusCode::CREATED).await?;
        debug!("Added pull request comment");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_pr(
        &self,
        owner: &str,
        repo: &str,
        pr_number: u64,
    ) -> Result<PullRequest, ClientError> {
        let response = self
            .client
            .get(self.pulls_url(owner, repo, pr_number))
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .send()
            .await?;

        Ok(expect_status(SERVICE, response, StatusCode::OK).await?.json().await?)
    }

    #[instrument(skip(self))]
    async fn get_pr_commits(
        &self,
        owner: &str,
        repo: &str,
        pr_number: u64,
    ) -> Result<Vec<PullRequestCommit>, ClientError> {
        let response = self
            .client
            .get(format!("{}/commits", self.pulls_url(owner, repo, pr_number)))
            .header(AUTHORIZATION, format!("Bearer {}", self.token))
            .send()
            .await?;

        let commits: Vec<PullRequestCommit> =
            expect_status(SERVICE, response, StatusCode::OK).await?.json().await?;
        debug!(count = commits.len(), "Retrieved pull request commits");
        Ok(commits)
    }
}
