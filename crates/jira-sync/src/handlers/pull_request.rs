//! `pull_request` opened, closed and synchronize handlers.

use serde_json::Value;

use super::{comment_ticket, request_ticket_reference, transition_all, HandlerContext};
use crate::error::PayloadError;
use crate::keys::extract_from_pull_request;
use crate::models::{ActionResult, EventResponse, ResponseDetails};
use crate::payload::pull_request_info;

/// Move referenced tickets to the "opened" status, or ask for a reference
/// when the PR has none.
pub(super) async fn opened(
    body: &Value,
    ctx: &HandlerContext,
) -> Result<EventResponse, PayloadError> {
    let pr = pull_request_info(body)?;
    let jira_keys = extract_from_pull_request(body);

    let results = if jira_keys.is_empty() {
        vec![request_ticket_reference(ctx, &pr).await]
    } else {
        transition_all(ctx, &jira_keys, &ctx.statuses.on_pr_opened, &pr).await
    };

    Ok(EventResponse::new(
        format!("PR #{} opened: {}", pr.number, pr.title),
        ResponseDetails::PullRequest { jira_keys, results },
    ))
}

/// Merged PRs move tickets to the "merged" status; unmerged ones to the
/// "declined" status when one is configured.
pub(super) async fn closed(
    body: &Value,
    ctx: &HandlerContext,
) -> Result<EventResponse, PayloadError> {
    let pr = pull_request_info(body)?;
    let jira_keys = extract_from_pull_request(body);
    let merged = pr.merged;

    let (outcome, results) = if jira_keys.is_empty() {
        (
            if merged { "merged" } else { "closed" },
            vec![ActionResult::success("No Jira keys found in PR")],
        )
    } else if merged {
        let results = transition_all(ctx, &jira_keys, &ctx.statuses.on_pr_merged, &pr).await;
        ("merged", results)
    } else {
        let results = match ctx.statuses.on_pr_declined.as_deref() {
            Some(status) => transition_all(ctx, &jira_keys, status, &pr).await,
            None => Vec::new(),
        };
        ("closed without merge", results)
    };

    Ok(EventResponse::new(
        format!("PR #{} {outcome}: {}", pr.number, pr.title),
        ResponseDetails::Closed {
            jira_keys,
            merged,
            results,
        },
    ))
}

/// Optionally note the new head commit on each ticket. Never transitions.
pub(super) async fn synchronized(
    body: &Value,
    ctx: &HandlerContext,
) -> Result<EventResponse, PayloadError> {
    let pr = pull_request_info(body)?;
    let jira_keys = extract_from_pull_request(body);

    let mut results = Vec::new();
    if ctx.statuses.comment_on_pr_sync {
        let text = format!(
            "PR #{} updated with new commits. Latest: {}",
            pr.number,
            pr.short_sha()
        );
        for key in &jira_keys {
            results.push(comment_ticket(ctx, key, &text).await);
        }
    }

    Ok(EventResponse::new(
        format!("PR #{} synchronized: {}", pr.number, pr.short_sha()),
        ResponseDetails::Synchronized {
            jira_keys,
            head_sha: pr.head_sha,
            results,
        },
    ))
}
