//! `pull_request_review` submitted handler.

use serde_json::Value;

use super::{transition_all, HandlerContext};
use crate::error::PayloadError;
use crate::keys::extract_from_pull_request;
use crate::models::{EventResponse, ResponseDetails};
use crate::payload::{pull_request_info, review_info, ReviewState};

/// Approvals and change requests transition tickets when a status is
/// configured for them. Other states are reported only.
pub(super) async fn submitted(
    body: &Value,
    ctx: &HandlerContext,
) -> Result<EventResponse, PayloadError> {
    let pr = pull_request_info(body)?;
    let review = review_info(body)?;
    let jira_keys = extract_from_pull_request(body);

    let target = match review.state {
        Some(ReviewState::Approved) => ctx.statuses.on_review_approved.as_deref(),
        Some(ReviewState::ChangesRequested) => ctx.statuses.on_changes_requested.as_deref(),
        _ => None,
    };
    let results = match target {
        Some(status) => transition_all(ctx, &jira_keys, status, &pr).await,
        None => Vec::new(),
    };

    let message = format!(
        "PR #{} review {} by {}",
        pr.number,
        review.state.as_ref().map_or("unknown", ReviewState::as_str),
        review.reviewer.as_deref().unwrap_or("unknown"),
    );
    Ok(EventResponse::new(
        message,
        ResponseDetails::Review {
            jira_keys,
            review_state: review.state,
            reviewer: review.reviewer,
            results,
        },
    ))
}
