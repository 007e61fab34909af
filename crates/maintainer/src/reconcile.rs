//! Reconciliation: turning a decision into idempotent tracker mutations.
//!
//! Label and notification writes are individually idempotent and safe to
//! repeat, so a sweep interrupted mid-object converges on the next run
//! instead of needing transactional semantics from the tracker.

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, instrument};
use tracker::{Comment, Issue, IssueTracker, TrackerError};

use crate::config::{MaintainerConfig, Phase};
use crate::engine::{evaluate, Decision, MilestoneState, NOTIFIER_NAME};
use crate::facts::IssueFacts;
use crate::labels::MILESTONE_STATE_LABELS;
use crate::message::render_notification;
use crate::notification::Notification;

/// Why an object was skipped without evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Closed,
    NoMilestone,
    /// Assigned to a milestone the policy does not target.
    UntargetedMilestone,
}

/// Result of reconciling one object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Filtered out before evaluation.
    Skipped(SkipReason),
    /// Decision computed and applied (possibly a no-op).
    Reconciled { state: MilestoneState },
}

/// Drives the fetch, decide, apply sequence for single objects.
pub struct MilestoneReconciler<'a> {
    tracker: &'a dyn IssueTracker,
    config: &'a MaintainerConfig,
}

impl<'a> MilestoneReconciler<'a> {
    /// The config must already be validated.
    #[must_use]
    pub fn new(tracker: &'a dyn IssueTracker, config: &'a MaintainerConfig) -> Self {
        Self { tracker, config }
    }

    /// Bring one object in line with the policy.
    #[instrument(skip(self, issue), fields(number = issue.number))]
    pub async fn reconcile(
        &self,
        org: &str,
        repo: &str,
        issue: &Issue,
    ) -> Result<ReconcileOutcome, TrackerError> {
        if issue.is_closed() {
            debug!("Ignoring closed object");
            return Ok(ReconcileOutcome::Skipped(SkipReason::Closed));
        }
        let Some(milestone) = issue.milestone_title() else {
            debug!("Ignoring object without a milestone");
            return Ok(ReconcileOutcome::Skipped(SkipReason::NoMilestone));
        };
        let Some(phase) = self.config.phase_for(milestone) else {
            debug!(milestone, "Ignoring object outside targeted milestones");
            return Ok(ReconcileOutcome::Skipped(SkipReason::UntargetedMilestone));
        };

        let facts = IssueFacts::gather(self.tracker, org, repo, issue).await?;
        let now = Utc::now();
        let decision = evaluate(&facts, self.config, phase, now);
        debug!(state = ?decision.state, phase = %phase, "Computed milestone decision");

        self.apply_state_label(&facts, decision.state.state_label())
            .await?;
        self.apply_notification(&facts, &decision, milestone, phase, now)
            .await?;
        if decision.state == MilestoneState::NeedsRemoval {
            self.tracker
                .clear_milestone(&facts.org, &facts.repo, facts.issue.number)
                .await?;
            info!(milestone, "Removed object from milestone");
        }

        Ok(ReconcileOutcome::Reconciled {
            state: decision.state,
        })
    }

    /// Ensure `desired` is the only state label on the object.
    ///
    /// Adds before removing so a crash between the two calls leaves the
    /// object over-labeled rather than unlabeled; the next run cleans up.
    async fn apply_state_label(
        &self,
        facts: &IssueFacts,
        desired: Option<&'static str>,
    ) -> Result<(), TrackerError> {
        let issue = &facts.issue;
        if let Some(label) = desired {
            if !issue.has_label(label) {
                self.tracker
                    .add_label(&facts.org, &facts.repo, issue.number, label)
                    .await?;
            }
        }
        for state_label in MILESTONE_STATE_LABELS {
            if desired != Some(state_label) && issue.has_label(state_label) {
                self.tracker
                    .remove_label(&facts.org, &facts.repo, issue.number, state_label)
                    .await?;
            }
        }
        Ok(())
    }

    /// Post the decision's notification unless the one already on the
    /// object is structurally identical and fresh enough.
    async fn apply_notification(
        &self,
        facts: &IssueFacts,
        decision: &Decision,
        milestone: &str,
        phase: Phase,
        now: DateTime<Utc>,
    ) -> Result<(), TrackerError> {
        let desired = render_notification(
            decision,
            self.config,
            milestone,
            phase,
            facts.issue.is_pull_request(),
        );
        let refresh_interval = decision
            .state
            .refresh_on_interval()
            .then_some(self.config.warning_interval);
        let existing = existing_notification(facts);

        if let Some((comment, notification)) = &existing {
            if notification_is_current(notification, &desired, comment, refresh_interval, now) {
                debug!("Notification already current");
                return Ok(());
            }
        }

        if let Some((comment, _)) = existing {
            self.tracker
                .delete_comment(&facts.org, &facts.repo, comment.id)
                .await?;
        }
        self.tracker
            .create_comment(
                &facts.org,
                &facts.repo,
                facts.issue.number,
                &desired.to_string(),
            )
            .await?;
        info!(state = ?decision.state, "Posted milestone notification");
        Ok(())
    }
}

/// The bot's existing notification comment, if one survives.
fn existing_notification(facts: &IssueFacts) -> Option<(&Comment, Notification)> {
    facts.comments.iter().find_map(|comment| {
        if comment.user.login != facts.bot_login {
            return None;
        }
        let notification = Notification::parse(&comment.body)?;
        notification
            .is_named(NOTIFIER_NAME)
            .then_some((comment, notification))
    })
}

/// Whether the posted notification already says what the decision says and
/// is recent enough to leave alone.
fn notification_is_current(
    existing: &Notification,
    desired: &Notification,
    comment: &Comment,
    refresh_interval: Option<Duration>,
    now: DateTime<Utc>,
) -> bool {
    existing == desired
        && refresh_interval.is_none_or(|interval| now - comment.created_at < interval)
}
