//! Configuration for the webhook service.

use std::env;
use std::time::Duration;

use crate::github_client::GITHUB_API_URL;

/// Jira connection settings.
#[derive(Clone)]
pub struct JiraConfig {
    /// Instance URL (e.g., `https://your-org.atlassian.net`).
    pub base_url: String,
    /// Account email used for basic auth.
    pub user_email: String,
    /// API token paired with the email.
    pub api_token: String,
}

/// Target statuses per PR lifecycle event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusConfig {
    /// Status when a PR is opened or reopened.
    pub on_pr_opened: String,
    /// Status when a PR is merged.
    pub on_pr_merged: String,
    /// Status when a PR is closed without merge (optional).
    pub on_pr_declined: Option<String>,
    /// Status when a review approves the PR (optional).
    pub on_review_approved: Option<String>,
    /// Status when a review requests changes (optional).
    pub on_changes_requested: Option<String>,
    /// Whether synchronize events add a Jira comment.
    pub comment_on_pr_sync: bool,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            on_pr_opened: "In Review".to_string(),
            on_pr_merged: "Done".to_string(),
            on_pr_declined: None,
            on_review_approved: None,
            on_changes_requested: None,
            comment_on_pr_sync: false,
        }
    }
}

/// Webhook service configuration.
#[derive(Clone)]
pub struct Config {
    /// HTTP server port.
    pub port: u16,
    /// Jira connection; `None` when any credential is missing.
    pub jira: Option<JiraConfig>,
    /// GitHub token for PR comments.
    pub github_token: Option<String>,
    /// GitHub API root (override for GitHub Enterprise).
    pub github_api_url: String,
    /// Timeout applied to every outbound call.
    pub http_timeout: Duration,
    /// Status transitions.
    pub statuses: StatusConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }
}

impl Config {
    /// Build configuration from an arbitrary key lookup.
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let flag = |key: &str| {
            get(key).is_some_and(|v| v.eq_ignore_ascii_case("true") || v == "1")
        };

        let jira = match (
            get("JIRA_BASE_URL"),
            get("JIRA_USER_EMAIL"),
            get("JIRA_API_TOKEN"),
        ) {
            (Some(base_url), Some(user_email), Some(api_token)) => Some(JiraConfig {
                base_url,
                user_email,
                api_token,
            }),
            _ => None,
        };

        let defaults = StatusConfig::default();

        Self {
            port: get("JIRA_SYNC_PORT")
                .and_then(|s| s.parse().ok())
                .unwrap_or(8080),
            jira,
            github_token: get("GITHUB_TOKEN"),
            github_api_url: get("GITHUB_API_URL").unwrap_or_else(|| GITHUB_API_URL.to_string()),
            http_timeout: Duration::from_secs(
                get("HTTP_TIMEOUT_SECS")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
            ),
            statuses: StatusConfig {
                on_pr_opened: get("STATUS_ON_PR_OPENED").unwrap_or(defaults.on_pr_opened),
                on_pr_merged: get("STATUS_ON_PR_MERGED").unwrap_or(defaults.on_pr_merged),
                on_pr_declined: get("STATUS_ON_PR_DECLINED"),
                on_review_approved: get("STATUS_ON_REVIEW_APPROVED"),
                on_changes_requested: get("STATUS_ON_CHANGES_REQUESTED"),
                comment_on_pr_sync: flag("COMMENT_ON_PR_SYNC"),
            },
        }
    }
}
