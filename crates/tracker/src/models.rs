//! GitHub REST wire models for issues, comments, and events.
//!
//! Only the fields the maintainer consumes are modeled; serde ignores the
//! rest of the payload. Timestamps deserialize into `DateTime<Utc>`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A GitHub account (issue author, event actor, bot identity).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub login: String,
}

/// A label attached to an issue or pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub name: String,
}

/// The milestone an issue is assigned to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    pub title: String,
}

/// Marker object present on issues that are really pull requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestLink {
    #[serde(default)]
    pub url: Option<String>,
}

/// An issue or pull request as returned by the issues and search APIs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub number: u64,
    /// `open` or `closed`.
    pub state: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub labels: Vec<Label>,
    /// Absent when the issue is not assigned to a milestone.
    #[serde(default)]
    pub milestone: Option<Milestone>,
    pub created_at: DateTime<Utc>,
    /// Present iff the object is a pull request.
    #[serde(default)]
    pub pull_request: Option<PullRequestLink>,
}

impl Issue {
    /// Whether the issue carries the named label. GitHub treats label
    /// names as case-insensitive, so the comparison does too.
    #[must_use]
    pub fn has_label(&self, name: &str) -> bool {
        self.labels
            .iter()
            .any(|label| label.name.eq_ignore_ascii_case(name))
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.state == "closed"
    }

    #[must_use]
    pub fn is_pull_request(&self) -> bool {
        self.pull_request.is_some()
    }

    /// Title of the assigned milestone, if any.
    #[must_use]
    pub fn milestone_title(&self) -> Option<&str> {
        self.milestone.as_ref().map(|m| m.title.as_str())
    }
}

/// A comment on an issue, or a review comment on a pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: u64,
    pub user: User,
    #[serde(default)]
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A timeline event on an issue (`labeled`, `unlabeled`, `reopened`, ...).
///
/// The event name stays a plain string: the timeline API emits many event
/// types and callers match on the few they care about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueEvent {
    pub event: String,
    /// Absent for events whose actor account was deleted.
    #[serde(default)]
    pub actor: Option<User>,
    /// Set for `labeled`/`unlabeled` events.
    #[serde(default)]
    pub label: Option<Label>,
    pub created_at: DateTime<Utc>,
}

impl IssueEvent {
    /// Whether this is a `labeled` event for `label_name` performed by
    /// `actor_login`.
    #[must_use]
    pub fn is_label_applied_by(&self, actor_login: &str, label_name: &str) -> bool {
        self.event == "labeled"
            && self
                .actor
                .as_ref()
                .is_some_and(|actor| actor.login == actor_login)
            && self
                .label
                .as_ref()
                .is_some_and(|label| label.name.eq_ignore_ascii_case(label_name))
    }
}

/// Response shape of `GET /search/issues`.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResults {
    pub total_count: u64,
    #[serde(default)]
    pub incomplete_results: bool,
    pub items: Vec<Issue>,
}
