//! In-memory fakes and payload builders for unit tests.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

use crate::config::StatusConfig;
use crate::error::ClientError;
use crate::github_client::SourceHost;
use crate::handlers::HandlerContext;
use crate::jira::IssueTracker;
use crate::models::{Issue, IssueFields, PullRequest, PullRequestCommit, StatusRef, Transition};

/// A GitHub `pull_request` webhook body.
pub fn pr_payload(action: &str, number: u64, title: &str, merged: bool) -> Value {
    json!({
        "action": action,
        "number": number,
        "pull_request": {
            "number": number,
            "title": title,
            "state": if action == "closed" { "closed" } else { "open" },
            "merged": merged,
            "html_url": format!("https://github.com/owner/repo/pull/{number}"),
            "user": { "login": "testuser" },
            "head": {
                "sha": "abc1234567890123456789012345678901234567",
                "ref": "feature/PROJ-123-new-feature"
            },
            "base": {
                "ref": "main",
                "repo": {
                    "name": "test-repo",
                    "owner": { "login": "test-owner" }
                }
            }
        }
    })
}

/// Same as [`pr_payload`] but with a branch carrying no ticket key.
pub fn pr_payload_plain_branch(action: &str, number: u64, title: &str, merged: bool) -> Value {
    let mut body = pr_payload(action, number, title, merged);
    body["pull_request"]["head"]["ref"] = json!("feature/x");
    body
}

/// Recording [`IssueTracker`] with a fixed transition list.
#[derive(Default)]
pub struct FakeTracker {
    pub transitions: Vec<Transition>,
    pub reject_transitions: bool,
    pub fail_comments: bool,
    pub fail_lookups: bool,
    pub executed: Mutex<Vec<(String, String)>>,
    pub comments: Mutex<Vec<(String, String)>>,
}

impl FakeTracker {
    /// Tracker offering the usual workflow transitions.
    pub fn with_workflow() -> Self {
        let transition = |id: &str, name: &str| Transition {
            id: id.to_string(),
            name: name.to_string(),
            to: Some(StatusRef {
                name: name.to_string(),
            }),
        };
        Self {
            transitions: vec![
                transition("11", "In Progress"),
                transition("21", "In Review"),
                transition("31", "Done"),
                transition("41", "Approved"),
                transition("51", "To Do"),
            ],
            ..Self::default()
        }
    }

    pub fn executed(&self) -> Vec<(String, String)> {
        self.executed.lock().unwrap().clone()
    }

    pub fn comments(&self) -> Vec<(String, String)> {
        self.comments.lock().unwrap().clone()
    }
}

fn unavailable(service: &'static str) -> ClientError {
    ClientError::Status {
        service,
        status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
        body: "unavailable".to_string(),
    }
}

#[async_trait]
impl IssueTracker for FakeTracker {
    async fn get_issue(&self, key: &str) -> Result<Issue, ClientError> {
        Ok(Issue {
            id: "1".to_string(),
            key: key.to_string(),
            fields: IssueFields::default(),
        })
    }

    async fn get_transitions(&self, _key: &str) -> Result<Vec<Transition>, ClientError> {
        if self.fail_lookups {
            return Err(unavailable("Jira"));
        }
        Ok(self.transitions.clone())
    }

    async fn execute_transition(
        &self,
        key: &str,
        transition_id: &str,
    ) -> Result<(), ClientError> {
        self.executed
            .lock()
            .unwrap()
            .push((key.to_string(), transition_id.to_string()));
        if self.reject_transitions {
            return Err(ClientError::TransitionRejected("workflow locked".to_string()));
        }
        Ok(())
    }

    async fn add_comment(&self, key: &str, text: &str) -> Result<(), ClientError> {
        self.comments
            .lock()
            .unwrap()
            .push((key.to_string(), text.to_string()));
        if self.fail_comments {
            return Err(unavailable("Jira"));
        }
        Ok(())
    }
}

/// Recording [`SourceHost`].
#[derive(Default)]
pub struct FakeHost {
    pub fail: bool,
    pub comments: Mutex<Vec<(String, String, u64, String)>>,
}

impl FakeHost {
    pub fn comments(&self) -> Vec<(String, String, u64, String)> {
        self.comments.lock().unwrap().clone()
    }
}

#[async_trait]
impl SourceHost for FakeHost {
    async fn add_pr_comment(
        &self,
        owner: &str,
        repo: &str,
        pr_number: u64,
        text: &str,
    ) -> Result<(), ClientError> {
        self.comments.lock().unwrap().push((
            owner.to_string(),
            repo.to_string(),
            pr_number,
            text.to_string(),
        ));
        if self.fail {
            return Err(unavailable("GitHub"));
        }
        Ok(())
    }

    async fn get_pr(
        &self,
        _owner: &str,
        _repo: &str,
        pr_number: u64,
    ) -> Result<PullRequest, ClientError> {
        Ok(PullRequest {
            number: pr_number,
            title: String::new(),
            state: "open".to_string(),
            body: None,
            merged: false,
            html_url: String::new(),
        })
    }

    async fn get_pr_commits(
        &self,
        _owner: &str,
        _repo: &str,
        _pr_number: u64,
    ) -> Result<Vec<PullRequestCommit>, ClientError> {
        Ok(vec![])
    }
}

/// Handler context wired to the given fakes.
pub fn context(
    tracker: &Arc<FakeTracker>,
    host: &Arc<FakeHost>,
    statuses: StatusConfig,
) -> HandlerContext {
    HandlerContext::new(
        Some(tracker.clone() as Arc<dyn IssueTracker>),
        Some(host.clone() as Arc<dyn SourceHost>),
        statuses,
    )
}
