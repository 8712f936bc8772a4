//! HTTP server for GitHub webhooks.

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::PayloadError;
use crate::github_client::{GitHubClient, SourceHost};
use crate::handlers::{dispatch, HandlerContext};
use crate::jira::{IssueTracker, JiraClient};
use crate::models::EventResponse;

/// Header name for GitHub event type.
const HEADER_EVENT: &str = "x-github-event";
/// Header name for GitHub delivery ID.
const HEADER_DELIVERY: &str = "x-github-delivery";
/// GitHub caps webhook payloads at 25 MB.
const MAX_PAYLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Clients and statuses handed to every handler.
    pub handlers: Arc<HandlerContext>,
}

impl AppState {
    #[must_use]
    pub fn new(handlers: HandlerContext) -> Self {
        Self {
            handlers: Arc::new(handlers),
        }
    }

    /// Build both clients from configuration.
    ///
    /// A client that is not configured, or cannot be built, is left out and
    /// the service keeps running without it.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let tracker: Option<Arc<dyn IssueTracker>> = match &config.jira {
            Some(jira) => match JiraClient::new(
                &jira.base_url,
                &jira.user_email,
                &jira.api_token,
                config.http_timeout,
            ) {
                Ok(client) => {
                    info!(base_url = %jira.base_url, "Jira client configured");
                    Some(Arc::new(client))
                }
                Err(e) => {
                    error!(error = %e, "Failed to create Jira client");
                    None
                }
            },
            None => {
                warn!("Jira connection not configured");
                None
            }
        };

        let source_host: Option<Arc<dyn SourceHost>> = match &config.github_token {
            Some(token) => {
                match GitHubClient::new(token, &config.github_api_url, config.http_timeout) {
                    Ok(client) => {
                        info!(api_url = %config.github_api_url, "GitHub client configured");
                        Some(Arc::new(client))
                    }
                    Err(e) => {
                        error!(error = %e, "Failed to create GitHub client");
                        None
                    }
                }
            }
            None => {
                warn!("GitHub connection not configured");
                None
            }
        };

        Self::new(HandlerContext::new(
            tracker,
            source_host,
            config.statuses.clone(),
        ))
    }
}

/// Build the HTTP router for the webhook service.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/webhooks/github", post(github_webhook_handler))
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .layer(DefaultBodyLimit::max(MAX_PAYLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// A delivery rejected as malformed, answered with `400 Bad Request`.
///
/// The body echoes what was received so the sender can see which field was
/// missing.
#[derive(Debug)]
pub struct WebhookError {
    error: PayloadError,
    payload: Option<Value>,
    github_event: Option<String>,
}

impl WebhookError {
    fn new(error: PayloadError, payload: Option<Value>, github_event: Option<String>) -> Self {
        Self {
            error,
            payload,
            github_event,
        }
    }
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let action = self
            .payload
            .as_ref()
            .and_then(|p| p.get("action"))
            .cloned()
            .unwrap_or(Value::Null);
        let body = json!({
            "status": "error",
            "message": self.error.to_string(),
            "payload_received": self.payload,
            "github_event": self.github_event,
            "action": action,
        });
        (StatusCode::BAD_REQUEST, Json(body)).into_response()
    }
}

async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "jira_connected": state.handlers.tracker.is_some(),
        "github_connected": state.handlers.source_host.is_some(),
    }))
}

/// Ready once a Jira client exists; without one no event can do useful work.
async fn readiness_check(State(state): State<AppState>) -> Result<Json<Value>, StatusCode> {
    if state.handlers.tracker.is_none() {
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    }
    Ok(Json(json!({ "status": "ready" })))
}

/// Handle incoming GitHub webhooks.
///
/// Well-formed deliveries always get `200`, even when Jira or GitHub calls
/// failed; those failures are listed in the response `results`.
pub async fn github_webhook_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<EventResponse>, WebhookError> {
    let github_event = headers
        .get(HEADER_EVENT)
        .and_then(|v| v.to_str().ok())
        .map(String::from);
    let delivery_id = headers
        .get(HEADER_DELIVERY)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown");

    info!(
        delivery_id = %delivery_id,
        event = github_event.as_deref().unwrap_or("unknown"),
        "Received GitHub webhook"
    );

    let payload: Value = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(error = %e, "Invalid webhook payload");
            return Err(WebhookError::new(
                PayloadError::InvalidJson(e.to_string()),
                None,
                github_event,
            ));
        }
    };

    match dispatch(&payload, github_event.as_deref(), &state.handlers).await {
        Ok(response) => {
            let action = payload
                .get("action")
                .and_then(Value::as_str)
                .unwrap_or("unknown");
            info!(
                delivery_id = %delivery_id,
                event = github_event.as_deref().unwrap_or("unknown"),
                action = action,
                response = %serde_json::to_string(&response).unwrap_or_default(),
                "Processed event"
            );
            Ok(Json(response))
        }
        Err(e) => {
            warn!(delivery_id = %delivery_id, error = %e, "Rejected webhook payload");
            Err(WebhookError::new(e, Some(payload), github_event))
        }
    }
}
