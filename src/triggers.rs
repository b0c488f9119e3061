//! External entry points.
//!
//! Besides install and startup, the agent restarts whenever the host observes
//! a successful response from a sign-in or alert-time endpoint.

use serde::{Deserialize, Serialize};

/// An external event that (re)starts the driver's cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    /// The agent was installed or updated.
    Installed,
    /// The host started. Leftover alarms are cleared first.
    Startup,
    /// The user just signed in or changed their alert hours.
    AuthenticationObserved,
    /// The user acknowledged an alert prompt.
    AlertAcknowledged,
}

/// Matches observed responses against `*`-wildcard URL patterns.
#[derive(Debug, Clone)]
pub struct AuthResponseFilter {
    patterns: Vec<String>,
}

impl AuthResponseFilter {
    pub fn new(patterns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            patterns: patterns.into_iter().map(Into::into).collect(),
        }
    }

    /// The trigger for a response with `status` from `url`, if it should
    /// restart the agent. Only HTTP 200 counts.
    #[must_use]
    pub fn classify(&self, url: &str, status: u16) -> Option<Trigger> {
        if status != 200 {
            return None;
        }
        self.patterns
            .iter()
            .any(|pattern| wildcard_match(pattern, url))
            .then_some(Trigger::AuthenticationObserved)
    }
}

/// `*` matches any run of characters (including none); everything else is literal.
fn wildcard_match(pattern: &str, text: &str) -> bool {
    let mut parts = pattern.split('*');
    let Some(first) = parts.next() else {
        return text.is_empty();
    };
    let Some(mut rest) = text.strip_prefix(first) else {
        return false;
    };

    let tail: Vec<&str> = parts.collect();
    let Some((last, middle)) = tail.split_last() else {
        // No `*` at all: exact match.
        return rest.is_empty();
    };

    for part in middle {
        match rest.find(part) {
            Some(pos) => rest = &rest[pos + part.len()..],
            None => return false,
        }
    }
    rest.len() >= last.len() && rest.ends_with(last)
}
