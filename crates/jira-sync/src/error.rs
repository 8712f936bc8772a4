//! Error types for payload interpretation and outbound API calls.

use reqwest::{Response, StatusCode};
use thiserror::Error;

/// A webhook payload that cannot be processed.
///
/// Raised before any outbound call is attempted; the server answers these
/// with `400 Bad Request`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PayloadError {
    /// The `X-GitHub-Event` header was absent or empty.
    #[error("Missing X-GitHub-Event header")]
    MissingHeader,

    /// The request body was not valid JSON.
    #[error("Invalid JSON payload: {0}")]
    InvalidJson(String),

    /// A top-level section (`pull_request`, `review`, `comment`) was absent.
    #[error("Payload does not contain {0} key")]
    MissingSection(&'static str),

    /// A required nested pull request field was absent.
    #[error("Pull request payload missing required field: {0}")]
    MissingField(&'static str),

    /// A required field was present but had the wrong shape.
    #[error("Pull request field {field} has unexpected value: {value}")]
    InvalidField {
        /// Dotted path of the offending field.
        field: &'static str,
        /// The value as received.
        value: String,
    },
}

/// Errors from the Jira or GitHub clients.
///
/// None of these abort a webhook; handlers record them per ticket key.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport-level failure (connect, timeout, decode).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with an unexpected status code.
    #[error("{service} API returned {status}: {body}")]
    Status {
        service: &'static str,
        status: StatusCode,
        body: String,
    },

    /// No transition leads to the requested status.
    #[error("No transition found to status '{0}'")]
    NoTransition(String),

    /// Jira refused to execute the transition.
    #[error("Failed to transition: {0}")]
    TransitionRejected(String),

    /// The client was never constructed because credentials are missing.
    #[error("{0} connection not configured")]
    NotConfigured(&'static str),
}

/// Pass `response` through when it has the `expected` status, otherwise turn
/// it into [`ClientError::Status`] carrying the body.
pub(crate) async fn expect_status(
    service: &'static str,
    response: Response,
    expected: StatusCode,
) -> Result<Response, ClientError> {
    let status = response.status();
    if status == expected {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ClientError::Status {
        service,
        status,
        body,
    })
}
