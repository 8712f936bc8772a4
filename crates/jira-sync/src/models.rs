//! Wire types for Jira and GitHub, and the webhook response envelope.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

use crate::keys::TicketKey;
use crate::payload::ReviewState;

// =========================================================================
// Jira
// =========================================================================

/// Jira issue (only the fields this service reads).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// Numeric identifier, as a string
    pub id: String,
    /// Human-readable key (e.g., "PROJ-123")
    pub key: String,
    #[serde(default)]
    pub fields: IssueFields,
}

/// Subset of an issue's `fields` object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueFields {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub status: Option<StatusRef>,
}

/// Reference to a workflow status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRef {
    pub name: String,
}

/// A workflow transition available on an issue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    /// Opaque transition ID used to execute it
    pub id: String,
    /// Transition name (e.g., "Start Review")
    pub name: String,
    /// Status the transition leads to
    #[serde(default)]
    pub to: Option<StatusRef>,
}

impl Transition {
    /// Name of the destination status, if Jira reported one.
    #[must_use]
    pub fn to_status_name(&self) -> Option<&str> {
        self.to.as_ref().map(|s| s.name.as_str())
    }
}

/// Response of `GET /issue/{key}/transitions`.
#[derive(Debug, Deserialize)]
pub(crate) struct TransitionsResponse {
    #[serde(default)]
    pub transitions: Vec<Transition>,
}

// =========================================================================
// GitHub
// =========================================================================

/// GitHub pull request summary.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    pub state: String,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub merged: bool,
    pub html_url: String,
}

/// Entry of `GET /pulls/{n}/commits`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PullRequestCommit {
    pub sha: String,
    pub commit: CommitDetail,
}

/// Git-level commit details.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CommitDetail {
    pub message: String,
}

// =========================================================================
// Webhook response
// =========================================================================

/// Outcome of one tracker or source-host action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionResult {
    pub success: bool,
    pub message: String,
}

impl ActionResult {
    #[must_use]
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Body returned to GitHub for every handled delivery.
///
/// `status` is always `"success"`: downstream failures are reported inside
/// `results`, never through the HTTP status.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventResponse {
    pub status: &'static str,
    pub message: String,
    #[serde(flatten)]
    pub details: ResponseDetails,
}

impl EventResponse {
    #[must_use]
    pub fn new(message: impl Into<String>, details: ResponseDetails) -> Self {
        Self {
            status: "success",
            message: message.into(),
            details,
        }
    }

    /// Keys reported by the handler, if it reports any.
    #[must_use]
    pub fn jira_keys(&self) -> Option<&BTreeSet<TicketKey>> {
        match &self.details {
            ResponseDetails::PullRequest { jira_keys, .. }
            | ResponseDetails::Closed { jira_keys, .. }
            | ResponseDetails::Synchronized { jira_keys, .. }
            | ResponseDetails::Review { jira_keys, .. }
            | ResponseDetails::Comment { jira_keys, .. }
            | ResponseDetails::Push { jira_keys, .. } => Some(jira_keys),
            ResponseDetails::Ping { .. } | ResponseDetails::Unhandled { .. } => None,
        }
    }

    /// Per-key results, if the handler records any.
    #[must_use]
    pub fn results(&self) -> Option<&[ActionResult]> {
        match &self.details {
            ResponseDetails::PullRequest { results, .. }
            | ResponseDetails::Closed { results, .. }
            | ResponseDetails::Synchronized { results, .. }
            | ResponseDetails::Review { results, .. } => Some(results.as_slice()),
            _ => None,
        }
    }
}

/// Handler-specific response fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResponseDetails {
    PullRequest {
        jira_keys: BTreeSet<TicketKey>,
        results: Vec<ActionResult>,
    },
    Closed {
        jira_keys: BTreeSet<TicketKey>,
        merged: bool,
        results: Vec<ActionResult>,
    },
    Synchronized {
        jira_keys: BTreeSet<TicketKey>,
        head_sha: String,
        results: Vec<ActionResult>,
    },
    Review {
        jira_keys: BTreeSet<TicketKey>,
        review_state: Option<ReviewState>,
        reviewer: Option<String>,
        results: Vec<ActionResult>,
    },
    Comment {
        jira_keys: BTreeSet<TicketKey>,
        commenter: Option<String>,
    },
    Push {
        jira_keys: BTreeSet<TicketKey>,
        #[serde(rename = "ref")]
        git_ref: String,
        commit_count: usize,
    },
    Ping {
        zen: String,
        hook_id: Value,
    },
    Unhandled {
        event_type: String,
        action: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_transition_deserialize() {
        let json = r#"{"id": "21", "name": "Start Review", "to": {"id": "3", "name": "In Review"}}"#;
        let transition: Transition = serde_json::from_str(json).unwrap();
        assert_eq!(transition.id, "21");
        assert_eq!(transition.to_status_name(), Some("In Review"));
    }

    #[test]
    fn test_transition_without_destination() {
        let transition: Transition =
            serde_json::from_str(r#"{"id": "1", "name": "Close"}"#).unwrap();
        assert!(transition.to_status_name().is_none());
    }

    #[test]
    fn test_issue_deserialize() {
        let json = r#"{
            "id": "10001",
            "key": "PROJ-1",
            "fields": { "summary": "Login page", "status": { "name": "To Do" } }
        }"#;
        let issue: Issue = serde_json::from_str(json).unwrap();
        assert_eq!(issue.key, "PROJ-1");
        assert_eq!(issue.fields.status.unwrap().name, "To Do");
    }

    #[test]
    fn test_event_response_flattens_details() {
        let response = EventResponse::new(
            "Push to refs/heads/main with 0 commits",
            ResponseDetails::Push {
                jira_keys: BTreeSet::new(),
                git_ref: "refs/heads/main".to_string(),
                commit_count: 0,
            },
        );
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(
            value,
            json!({
                "status": "success",
                "message": "Push to refs/heads/main with 0 commits",
                "jira_keys": [],
                "ref": "refs/heads/main",
                "commit_count": 0
            })
        );
    }

    #[test]
    fn test_review_response_keeps_null_fields() {
        let response = EventResponse::new(
            "review",
            ResponseDetails::Review {
                jira_keys: BTreeSet::new(),
                review_state: None,
                reviewer: None,
                results: vec![],
            },
        );
        let value = serde_json::to_value(&response).unwrap();
        assert!(value["review_state"].is_null());
        assert!(value.as_object().unwrap().contains_key("reviewer"));
    }
}
