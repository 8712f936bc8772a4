//! GitHub webhook receiver that keeps Jira tickets in step with pull requests.
//!
//! This crate provides:
//! - Ticket key extraction from PR titles, branches, bodies and commit messages
//! - Payload interpretation for GitHub webhook events
//! - REST client for Jira Cloud (transitions and comments)
//! - REST client for GitHub (pull request comments)
//! - Event handlers and the dispatcher that selects them
//! - HTTP server for webhook handling (standalone service)

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)] // Many async API methods can fail

pub mod config;
pub mod error;
pub mod github_client;
pub mod handlers;
pub mod jira;
pub mod keys;
pub mod models;
pub mod payload;
pub mod server;

#[cfg(test)]
pub(crate) mod test_utils;

pub use config::{Config, StatusConfig};
pub use error::{ClientError, PayloadError};
pub use github_client::{GitHubClient, SourceHost};
pub use handlers::{dispatch, select_handler, Handler, HandlerContext};
pub use jira::{IssueTracker, JiraClient};
pub use keys::{extract, extract_from_pull_request, TicketKey};
pub use models::{ActionResult, EventResponse, ResponseDetails};
pub use payload::{EventCategory, EventEnvelope};
