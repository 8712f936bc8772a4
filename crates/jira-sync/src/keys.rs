//! Jira ticket key extraction.
//!
//! A ticket key is an upper-case project prefix of at least two characters,
//! a hyphen and a number (`PROJ-123`). Matching is regex-based, so a key
//! embedded in a longer token such as `feature/PROJ-7-login` is still found.

use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::LazyLock;

/// Upper-case prefix of two or more characters, hyphen, digits.
static TICKET_KEY_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Z][A-Z0-9]+-[0-9]+").unwrap());

/// A Jira issue key such as `PROJ-123`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct TicketKey(String);

impl TicketKey {
    /// Parse a string that must consist of exactly one ticket key.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let m = TICKET_KEY_PATTERN.find(s)?;
        (m.start() == 0 && m.end() == s.len()).then(|| Self(s.to_string()))
    }

    /// The key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TicketKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TicketKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Extract every ticket key from `text`.
///
/// Absent or empty text yields an empty set. Duplicates collapse; the set is
/// ordered so callers iterate keys deterministically.
pub fn extract<'a>(text: impl Into<Option<&'a str>>) -> BTreeSet<TicketKey> {
    text.into()
        .map(|t| {
            TICKET_KEY_PATTERN
                .find_iter(t)
                .map(|m| TicketKey(m.as_str().to_string()))
                .collect()
        })
        .unwrap_or_default()
}

/// Extract keys from a pull request event body.
///
/// Unions the matches in `pull_request.title`, `pull_request.head.ref` and
/// `pull_request.body`. Missing fields count as empty text.
#[must_use]
pub fn extract_from_pull_request(body: &Value) -> BTreeSet<TicketKey> {
    let pr = &body["pull_request"];
    let mut keys = extract(pr["title"].as_str());
    keys.extend(extract(pr["head"]["ref"].as_str()));
    keys.extend(extract(pr["body"].as_str()));
    keys
}
