//! `issue_comment` created handler.

use serde_json::Value;

use crate::error::PayloadError;
use crate::keys::extract;
use crate::models::{EventResponse, ResponseDetails};
use crate::payload::comment_info;

/// Report the commenter and the keys in the PR title. The comment body is
/// not scanned and nothing is written to the tracker.
pub(super) fn created(body: &Value) -> Result<EventResponse, PayloadError> {
    let comment = comment_info(body)?;
    // issue_comment events carry the PR under `issue`
    let issue = &body["issue"];
    let jira_keys = extract(issue["title"].as_str());

    let number = issue["number"]
        .as_u64()
        .map_or_else(|| "unknown".to_string(), |n| n.to_string());
    let message = format!(
        "Comment on PR #{number} by {}",
        comment.author.as_deref().unwrap_or("unknown")
    );

    Ok(EventResponse::new(
        message,
        ResponseDetails::Comment {
            jira_keys,
            commenter: comment.author,
        },
    ))
}
