//! `push` handler.

use serde_json::Value;
use std::collections::BTreeSet;

use crate::keys::{extract, TicketKey};
use crate::models::{EventResponse, ResponseDetails};

/// Collect keys across every commit message in the push.
pub(super) fn pushed(body: &Value) -> EventResponse {
    let git_ref = body["ref"].as_str().unwrap_or_default().to_string();
    let commits = body["commits"]
        .as_array()
        .map(Vec::as_slice)
        .unwrap_or_default();

    let jira_keys: BTreeSet<TicketKey> = commits
        .iter()
        .flat_map(|commit| extract(commit["message"].as_str()))
        .collect();

    EventResponse::new(
        format!("Push to {git_ref} with {} commits", commits.len()),
        ResponseDetails::Push {
            jira_keys,
            git_ref,
            commit_count: commits.len(),
        },
    )
}
