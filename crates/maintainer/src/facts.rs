//! Prefetched per-object snapshot.
//!
//! All tracker reads happen here, up front, so that grace-period and
//! staleness arithmetic and the policy engine itself are pure functions of
//! the snapshot. Nothing is cached across invocations: every reconcile run
//! re-reads the object from scratch.

use tracker::{Comment, Issue, IssueEvent, IssueTracker, TrackerError};

/// Everything known about one object at evaluation time.
#[derive(Debug, Clone)]
pub struct IssueFacts {
    pub org: String,
    pub repo: String,
    pub issue: Issue,
    /// Issue comments, oldest first.
    pub comments: Vec<Comment>,
    /// Timeline events, oldest first.
    pub events: Vec<IssueEvent>,
    /// Review comments; always empty for plain issues.
    pub review_comments: Vec<Comment>,
    /// Login the tracker client authenticates as.
    pub bot_login: String,
}

impl IssueFacts {
    /// Fetch the full snapshot for `issue`.
    pub async fn gather(
        tracker: &dyn IssueTracker,
        org: &str,
        repo: &str,
        issue: &Issue,
    ) -> Result<Self, TrackerError> {
        let bot_login = tracker.bot_identity().await?;
        let comments = tracker.list_comments(org, repo, issue.number).await?;
        let events = tracker.list_events(org, repo, issue.number).await?;
        let review_comments = if issue.is_pull_request() {
            tracker.list_review_comments(org, repo, issue.number).await?
        } else {
            Vec::new()
        };

        Ok(Self {
            org: org.to_string(),
            repo: repo.to_string(),
            issue: issue.clone(),
            comments,
            events,
            review_comments,
            bot_login,
        })
    }
}
