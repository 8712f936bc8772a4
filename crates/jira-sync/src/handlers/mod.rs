//! Event handlers and the dispatcher that selects them.
//!
//! Each [`Handler`] variant covers one (category, action) pair. Handlers
//! only fail on malformed payloads; tracker and source-host failures are
//! recorded per ticket key in the response `results`.

mod comment;
mod ping;
mod pull_request;
mod push;
mod review;

use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::config::StatusConfig;
use crate::error::{ClientError, PayloadError};
use crate::github_client::SourceHost;
use crate::jira::IssueTracker;
use crate::keys::TicketKey;
use crate::models::{ActionResult, EventResponse, ResponseDetails};
use crate::payload::{classify, is_ping, EventCategory, EventEnvelope, PullRequestInfo};

/// Comment posted on pull requests that reference no ticket.
const TICKET_REFERENCE_REQUEST: &str = "This pull request doesn't appear to reference a Jira ticket. \
Please include the Jira issue key in the PR title or description \
(e.g., `PROJ-123: Add new feature`).\n\n\
This helps us automatically track progress in Jira.";

/// Clients and settings shared by every handler.
///
/// Either client may be absent when its credentials were not configured.
#[derive(Clone)]
pub struct HandlerContext {
    /// Jira client.
    pub tracker: Option<Arc<dyn IssueTracker>>,
    /// GitHub client.
    pub source_host: Option<Arc<dyn SourceHost>>,
    /// Target statuses per event.
    pub statuses: StatusConfig,
}

impl HandlerContext {
    #[must_use]
    pub fn new(
        tracker: Option<Arc<dyn IssueTracker>>,
        source_host: Option<Arc<dyn SourceHost>>,
        statuses: StatusConfig,
    ) -> Self {
        Self {
            tracker,
            source_host,
            statuses,
        }
    }
}

/// The business logic bound to one (category, action) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handler {
    /// `pull_request` opened or reopened
    PrOpened,
    /// `pull_request` closed, merged or not
    PrClosed,
    /// `pull_request` synchronize (new commits pushed)
    PrSynchronize,
    /// `pull_request_review` submitted
    ReviewSubmitted,
    /// `issue_comment` created
    PrComment,
    /// `push`, any action
    Push,
    /// Webhook setup verification
    Ping,
    /// Everything else
    Unhandled,
}

/// Select the handler for a category and action.
///
/// Categories that need an action fall through to [`Handler::Unhandled`]
/// when it is absent.
#[must_use]
pub fn select_handler(category: &EventCategory, action: Option<&str>) -> Handler {
    match (category, action) {
        (EventCategory::PullRequest, Some("opened" | "reopened")) => Handler::PrOpened,
        (EventCategory::PullRequest, Some("closed")) => Handler::PrClosed,
        (EventCategory::PullRequest, Some("synchronize")) => Handler::PrSynchronize,
        (EventCategory::PullRequestReview, Some("submitted")) => Handler::ReviewSubmitted,
        (EventCategory::IssueComment, Some("created")) => Handler::PrComment,
        (EventCategory::Push, _) => Handler::Push,
        (EventCategory::Ping, _) => Handler::Ping,
        _ => Handler::Unhandled,
    }
}

impl Handler {
    /// Run the handler against a classified delivery.
    pub async fn execute(
        self,
        envelope: &EventEnvelope<'_>,
        ctx: &HandlerContext,
    ) -> Result<EventResponse, PayloadError> {
        let body = envelope.body;
        match self {
            Self::PrOpened => pull_request::opened(body, ctx).await,
            Self::PrClosed => pull_request::closed(body, ctx).await,
            Self::PrSynchronize => pull_request::synchronized(body, ctx).await,
            Self::ReviewSubmitted => review::submitted(body, ctx).await,
            Self::PrComment => comment::created(body),
            Self::Push => Ok(push::pushed(body)),
            Self::Ping => Ok(ping::pong(body)),
            Self::Unhandled => Ok(unhandled(envelope)),
        }
    }
}

/// Route a delivery to its handler.
///
/// Pings are recognised by header or by body shape before the event header
/// is required, so a ping without `X-GitHub-Event` still succeeds.
pub async fn dispatch(
    body: &Value,
    github_event: Option<&str>,
    ctx: &HandlerContext,
) -> Result<EventResponse, PayloadError> {
    if github_event == Some("ping") || is_ping(body) {
        return Ok(ping::pong(body));
    }

    let envelope = classify(body, github_event)?;
    let handler = select_handler(&envelope.category, envelope.action.as_deref());
    debug!(
        event = %envelope.category,
        action = envelope.action.as_deref().unwrap_or("unknown"),
        ?handler,
        "Dispatching event"
    );
    handler.execute(&envelope, ctx).await
}

fn unhandled(envelope: &EventEnvelope<'_>) -> EventResponse {
    let event_type = envelope.category.to_string();
    EventResponse::new(
        format!(
            "Received unhandled event: {event_type}/{}",
            envelope.action.as_deref().unwrap_or("unknown")
        ),
        ResponseDetails::Unhandled {
            event_type,
            action: envelope.action.clone(),
        },
    )
}

/// Comment on the ticket, then move it to `target_status`.
///
/// A failed comment is only logged; the transition is attempted regardless.
async fn transition_ticket(
    ctx: &HandlerContext,
    key: &TicketKey,
    target_status: &str,
    pr: &PullRequestInfo,
) -> ActionResult {
    let Some(tracker) = &ctx.tracker else {
        let message = format!("No Jira connection - cannot transition {key}");
        error!(ticket = %key, "{message}");
        return ActionResult::failure(message);
    };

    let comment = format!(
        "PR #{} ({}) - transitioning to {target_status}\n{}",
        pr.number, pr.title, pr.html_url
    );
    if let Err(e) = tracker.add_comment(key.as_str(), &comment).await {
        warn!(ticket = %key, error = %e, "Could not add comment");
    }

    match tracker.transition_to_status(key.as_str(), target_status).await {
        Ok(message) => {
            info!(ticket = %key, status = target_status, "Transitioned ticket");
            ActionResult::success(message)
        }
        Err(e @ (ClientError::NoTransition(_) | ClientError::TransitionRejected(_))) => {
            warn!(ticket = %key, status = target_status, error = %e, "Transition not applied");
            ActionResult::failure(e.to_string())
        }
        Err(e) => {
            let message = format!("Failed to transition {key}: {e}");
            error!(ticket = %key, status = target_status, error = %e, "Transition failed");
            ActionResult::failure(message)
        }
    }
}

/// Transition every key, one result per key in key order.
async fn transition_all(
    ctx: &HandlerContext,
    keys: &BTreeSet<TicketKey>,
    target_status: &str,
    pr: &PullRequestInfo,
) -> Vec<ActionResult> {
    let mut results = Vec::with_capacity(keys.len());
    for key in keys {
        results.push(transition_ticket(ctx, key, target_status, pr).await);
    }
    results
}

async fn comment_ticket(ctx: &HandlerContext, key: &TicketKey, text: &str) -> ActionResult {
    let Some(tracker) = &ctx.tracker else {
        let message = format!("No Jira connection - cannot add comment to {key}");
        error!(ticket = %key, "{message}");
        return ActionResult::failure(message);
    };

    match tracker.add_comment(key.as_str(), text).await {
        Ok(()) => {
            info!(ticket = %key, "Added comment");
            ActionResult::success(format!("Added comment to {key}"))
        }
        Err(e) => {
            error!(ticket = %key, error = %e, "Failed to add comment");
            ActionResult::failure(format!("Failed to add comment to {key}: {e}"))
        }
    }
}

async fn post_ticket_reference_request(
    ctx: &HandlerContext,
    pr: &PullRequestInfo,
) -> Result<(), ClientError> {
    let host = ctx
        .source_host
        .as_ref()
        .ok_or(ClientError::NotConfigured("GitHub"))?;
    host.add_pr_comment(
        &pr.repo_owner,
        &pr.repo_name,
        pr.number,
        TICKET_REFERENCE_REQUEST,
    )
    .await
}

/// Ask the PR author to reference a ticket.
async fn request_ticket_reference(ctx: &HandlerContext, pr: &PullRequestInfo) -> ActionResult {
    match post_ticket_reference_request(ctx, pr).await {
        Ok(()) => {
            info!(pr = pr.number, "Added missing Jira comment to PR");
            ActionResult::success("No Jira keys found in PR - comment added")
        }
        Err(e) => {
            error!(pr = pr.number, error = %e, "Could not comment on PR");
            ActionResult::failure(format!("No Jira keys found in PR - could not add comment: {e}"))
        }
    }
}
