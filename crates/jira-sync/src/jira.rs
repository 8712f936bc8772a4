//! REST client for Jira Cloud.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::fmt;
use std::time::Duration;
use tracing::{debug, instrument};

use crate::error::{expect_status, ClientError};
use crate::models::{Issue, Transition, TransitionsResponse};

const SERVICE: &str = "Jira";

/// Issue tracker operations used by the webhook handlers.
///
/// `resolve_transition` and `transition_to_status` are derived from the
/// four primitive calls, so fakes only implement those.
#[async_trait]
pub trait IssueTracker: Send + Sync {
    /// Fetch an issue by key.
    async fn get_issue(&self, key: &str) -> Result<Issue, ClientError>;

    /// Transitions available from the issue's current status, in the order
    /// the tracker lists them.
    async fn get_transitions(&self, key: &str) -> Result<Vec<Transition>, ClientError>;

    /// Execute a transition. Anything other than an accepted transition is
    /// [`ClientError::TransitionRejected`] carrying the response body.
    async fn execute_transition(&self, key: &str, transition_id: &str)
        -> Result<(), ClientError>;

    /// Append a plain-text comment to an issue.
    async fn add_comment(&self, key: &str, text: &str) -> Result<(), ClientError>;

    /// Find the transition leading to `target_status`.
    async fn resolve_transition(
        &self,
        key: &str,
        target_status: &str,
    ) -> Result<Option<String>, ClientError> {
        let transitions = self.get_transitions(key).await?;
        Ok(find_transition(&transitions, target_status).map(|t| t.id.clone()))
    }

    /// Move an issue to the status named `target_status`.
    ///
    /// Fails with [`ClientError::NoTransition`] without calling
    /// `execute_transition` when no transition leads there.
    async fn transition_to_status(
        &self,
        key: &str,
        target_status: &str,
    ) -> Result<String, ClientError> {
        let Some(transition_id) = self.resolve_transition(key, target_status).await? else {
            return Err(ClientError::NoTransition(target_status.to_string()));
        };
        self.execute_transition(key, &transition_id).await?;
        Ok(format!("Transitioned {key} to {target_status}"))
    }
}

/// First transition whose own name or destination status name matches
/// `target_status`, ignoring case.
#[must_use]
pub fn find_transition<'a>(transitions: &'a [Transition], target_status: &str) -> Option<&'a Transition> {
    let target = target_status.to_lowercase();
    transitions.iter().find(|t| {
        t.name.to_lowercase() == target
            || t.to_status_name()
                .is_some_and(|name| name.to_lowercase() == target)
    })
}

/// Wrap plain text in the Atlassian Document Format envelope Jira Cloud
/// requires for comment bodies.
#[must_use]
pub fn adf_document(text: &str) -> Value {
    json!({
        "type": "doc",
        "version": 1,
        "content": [
            {
                "type": "paragraph",
                "content": [{ "type": "text", "text": text }]
            }
        ]
    })
}

/// Jira Cloud REST v3 client using email + API token basic auth.
#[derive(Clone)]
pub struct JiraClient {
    client: reqwest::Client,
    api_url: String,
    email: String,
    api_token: String,
}

impl fmt::Debug for JiraClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JiraClient")
            .field("api_url", &self.api_url)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

impl JiraClient {
    /// Create a client for the instance at `base_url`
    /// (e.g. `https://your-org.atlassian.net`).
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built
    pub fn new(
        base_url: &str,
        email: &str,
        api_token: &str,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            api_url: format!("{}/rest/api/3", base_url.trim_end_matches('/')),
            email: email.to_string(),
            api_token: api_token.to_string(),
        })
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .get(format!("{}{path}", self.api_url))
            .basic_auth(&self.email, Some(&self.api_token))
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.client
            .post(format!("{}{path}", self.api_url))
            .basic_auth(&self.email, Some(&self.api_token))
    }
}

#[async_trait]
impl IssueTracker for JiraClient {
    #[instrument(skip(self))]
    async fn get_issue(&self, key: &str) -> Result<Issue, ClientError> {
        let response = self.get(&format!("/issue/{key}")).send().await?;
        let issue: Issue = expect_status(SERVICE, response, StatusCode::OK)
            .await?
            .json()
            .await?;
        debug!(issue_id = %issue.id, "Retrieved issue");
        Ok(issue)
    }

    #[instrument(skip(self))]
    async fn get_transitions(&self, key: &str) -> Result<Vec<Transition>, ClientError> {
        let response = self.get(&format!("/issue/{key}/transitions")).send().await?;
        let parsed: TransitionsResponse =
            expect_status(SERVICE, response, StatusCode::OK).await?.json().await?;
        debug!(count = parsed.transitions.len(), "Retrieved transitions");
        Ok(parsed.transitions)
    }

    #[instrument(skip(self))]
    async fn execute_transition(
        &self,
        key: &str,
        transition_id: &str,
    ) -> Result<(), ClientError> {
        let response = self
            .post(&format!("/issue/{key}/transitions"))
            .json(&json!({ "transition": { "id": transition_id } }))
            .send()
            .await?;

        if response.status() == StatusCode::NO_CONTENT {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(ClientError::TransitionRejected(body))
    }

    #[instrument(skip(self, text))]
    async fn add_comment(&self, key: &str, text: &str) -> Result<(), ClientError> {
        let response = self
            .post(&format!("/issue/{key}/comment"))
            .json(&json!({ "body": adf_document(text) }))
            .send()
            .await?;
        expect_status(SERVICE, response, StatusCode::CREATED).await?;
        Ok(())
    }
}
