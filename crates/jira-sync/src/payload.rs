//! GitHub webhook payload interpretation.
//!
//! Payloads are walked as [`serde_json::Value`] rather than deserialized into
//! one large struct, so that a missing field can be reported by its dotted
//! path (`base.repo.owner.login`) instead of a serde position.

use serde::{Serialize, Serializer};
use serde_json::Value;
use std::fmt;

use crate::error::PayloadError;

/// Event category taken from the `X-GitHub-Event` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventCategory {
    PullRequest,
    PullRequestReview,
    IssueComment,
    Push,
    Ping,
    /// Any category this service does not act on.
    Other(String),
}

impl EventCategory {
    /// Map a header value onto a category.
    #[must_use]
    pub fn from_header(value: &str) -> Self {
        match value {
            "pull_request" => Self::PullRequest,
            "pull_request_review" => Self::PullRequestReview,
            "issue_comment" => Self::IssueComment,
            "push" => Self::Push,
            "ping" => Self::Ping,
            other => Self::Other(other.to_string()),
        }
    }

    /// The header spelling of the category.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::PullRequest => "pull_request",
            Self::PullRequestReview => "pull_request_review",
            Self::IssueComment => "issue_comment",
            Self::Push => "push",
            Self::Ping => "ping",
            Self::Other(other) => other,
        }
    }
}

impl fmt::Display for EventCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified webhook delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct EventEnvelope<'a> {
    pub category: EventCategory,
    /// The payload's `action` field, when present.
    pub action: Option<String>,
    pub body: &'a Value,
}

/// Pull request state as reported by GitHub.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrState {
    Open,
    Closed,
}

/// Fields of the `pull_request` section that handlers rely on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestInfo {
    pub number: u64,
    pub title: String,
    pub state: PrState,
    pub merged: bool,
    pub head_sha: String,
    pub head_ref: String,
    pub base_ref: String,
    pub repo_owner: String,
    pub repo_name: String,
    pub html_url: String,
    pub author: String,
}

impl PullRequestInfo {
    /// The first seven characters of the head commit.
    #[must_use]
    pub fn short_sha(&self) -> &str {
        self.head_sha
            .char_indices()
            .nth(7)
            .map_or(self.head_sha.as_str(), |(idx, _)| &self.head_sha[..idx])
    }
}

/// Review verdict carried by a `pull_request_review` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewState {
    Approved,
    ChangesRequested,
    Commented,
    Dismissed,
    Other(String),
}

impl ReviewState {
    /// Parse a webhook review state. Matching is exact; anything else,
    /// including other casings, is kept verbatim in [`ReviewState::Other`].
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value {
            "approved" => Self::Approved,
            "changes_requested" => Self::ChangesRequested,
            "commented" => Self::Commented,
            "dismissed" => Self::Dismissed,
            _ => Self::Other(value.to_string()),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Approved => "approved",
            Self::ChangesRequested => "changes_requested",
            Self::Commented => "commented",
            Self::Dismissed => "dismissed",
            Self::Other(other) => other,
        }
    }
}

impl fmt::Display for ReviewState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for ReviewState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// The `review` section of a review event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewInfo {
    pub state: Option<ReviewState>,
    pub reviewer: Option<String>,
    pub body: String,
}

/// The `comment` section of an issue comment event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentInfo {
    pub body: String,
    pub author: Option<String>,
}

/// Whether the body is a GitHub ping (sent when a webhook is created).
#[must_use]
pub fn is_ping(body: &Value) -> bool {
    body.get("zen").is_some() && body.get("hook_id").is_some()
}

/// Classify a delivery from its event header and body.
///
/// The header is the only hard requirement; the action is optional because
/// some categories (`push`) carry none.
pub fn classify<'a>(
    body: &'a Value,
    github_event: Option<&str>,
) -> Result<EventEnvelope<'a>, PayloadError> {
    let category = github_event
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .map(EventCategory::from_header)
        .ok_or(PayloadError::MissingHeader)?;

    Ok(EventEnvelope {
        category,
        action: body.get("action").and_then(Value::as_str).map(String::from),
        body,
    })
}

/// A top-level section; `null` and empty objects count as absent.
fn section<'a>(body: &'a Value, name: &'static str) -> Result<&'a Value, PayloadError> {
    body.get(name)
        .filter(|v| v.as_object().is_some_and(|o| !o.is_empty()))
        .ok_or(PayloadError::MissingSection(name))
}

/// Look up a dotted path, treating `null` as absent.
fn field<'a>(root: &'a Value, path: &'static str) -> Result<&'a Value, PayloadError> {
    path.split('.').try_fold(root, |value, segment| {
        value
            .get(segment)
            .filter(|v| !v.is_null())
            .ok_or(PayloadError::MissingField(path))
    })
}

fn string_field(root: &Value, path: &'static str) -> Result<String, PayloadError> {
    let value = field(root, path)?;
    value
        .as_str()
        .map(String::from)
        .ok_or_else(|| PayloadError::InvalidField {
            field: path,
            value: value.to_string(),
        })
}

/// Extract the pull request fields from a `pull_request` or
/// `pull_request_review` body.
///
/// Fails on the first absent required field, checked in a fixed order.
/// `merged` is optional and defaults to `false`.
pub fn pull_request_info(body: &Value) -> Result<PullRequestInfo, PayloadError> {
    let pr = section(body, "pull_request")?;

    let number_value = field(pr, "number")?;
    let number = number_value
        .as_u64()
        .ok_or_else(|| PayloadError::InvalidField {
            field: "number",
            value: number_value.to_string(),
        })?;
    let title = string_field(pr, "title")?;
    let state = match string_field(pr, "state")?.as_str() {
        "open" => PrState::Open,
        "closed" => PrState::Closed,
        other => {
            return Err(PayloadError::InvalidField {
                field: "state",
                value: other.to_string(),
            })
        }
    };

    Ok(PullRequestInfo {
        number,
        title,
        state,
        merged: pr.get("merged").and_then(Value::as_bool).unwrap_or(false),
        head_sha: string_field(pr, "head.sha")?,
        head_ref: string_field(pr, "head.ref")?,
        base_ref: string_field(pr, "base.ref")?,
        repo_owner: string_field(pr, "base.repo.owner.login")?,
        repo_name: string_field(pr, "base.repo.name")?,
        html_url: string_field(pr, "html_url")?,
        author: string_field(pr, "user.login")?,
    })
}

/// Extract the `review` section. Only a non-empty section is required.
pub fn review_info(body: &Value) -> Result<ReviewInfo, PayloadError> {
    let review = section(body, "review")?;

    Ok(ReviewInfo {
        state: review["state"].as_str().map(ReviewState::parse),
        reviewer: review["user"]["login"].as_str().map(String::from),
        body: review["body"].as_str().unwrap_or_default().to_string(),
    })
}

/// Extract the `comment` section. Only a non-empty section is required.
pub fn comment_info(body: &Value) -> Result<CommentInfo, PayloadError> {
    let comment = section(body, "comment")?;

    Ok(CommentInfo {
        body: comment["body"].as_str().unwrap_or_default().to_string(),
        author: comment["user"]["login"].as_str().map(String::from),
    })
}
