//! Milestone policy decision engine.
//!
//! `evaluate` classifies one open, milestone-targeted object into a
//! [`MilestoneState`] and collects everything the notification needs to
//! say about it. It is a pure function of the prefetched facts, the
//! policy, the release phase, and the clock; the reconciler turns the
//! resulting [`Decision`] into tracker mutations.

use chrono::{DateTime, Duration, Utc};

use crate::activity::last_modification_time;
use crate::config::{MaintainerConfig, Phase};
use crate::facts::IssueFacts;
use crate::grace::grace_period_remaining;
use crate::labels::{self, check_labels, Kind, Priority};

/// Marker name of the notification comment this engine maintains.
pub const NOTIFIER_NAME: &str = "MilestoneNotifier";

/// Where an object stands with respect to the milestone process.
///
/// Recomputed from scratch on every run; nothing is persisted between
/// invocations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MilestoneState {
    /// Compliant with the current phase; no action needed.
    Current,
    /// The kind/priority/sig label triad is incomplete.
    NeedsLabeling,
    /// Not yet approved for the milestone by a SIG maintainer.
    NeedsApproval,
    /// Approved but missing in-progress status or a recent update.
    NeedsAttention,
    /// Being removed from the milestone on this run.
    NeedsRemoval,
}

impl MilestoneState {
    /// The state label pinned on objects in this state, if any.
    #[must_use]
    pub const fn state_label(self) -> Option<&'static str> {
        match self {
            Self::Current => None,
            Self::NeedsLabeling => Some(labels::INCOMPLETE_LABELS_LABEL),
            Self::NeedsApproval => Some(labels::NEEDS_APPROVAL_LABEL),
            Self::NeedsAttention => Some(labels::NEEDS_ATTENTION_LABEL),
            Self::NeedsRemoval => Some(labels::REMOVED_LABEL),
        }
    }

    /// Whether an unchanged notification is reposted once it is older
    /// than the warning interval.
    #[must_use]
    pub const fn refresh_on_interval(self) -> bool {
        matches!(
            self,
            Self::NeedsLabeling | Self::NeedsApproval | Self::NeedsAttention
        )
    }
}

/// The complete label triad, echoed back in every summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelSummary {
    pub kind: Kind,
    pub priority: Priority,
    pub sig_labels: Vec<String>,
}

/// Label deficiencies plus the removal deadline, when one applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelingWarning {
    pub errors: Vec<String>,
    /// Positive time left before auto-removal; `None` when no deadline
    /// applies or it is not worth announcing.
    pub remove_after: Option<Duration>,
}

/// Missing milestone approval plus the removal deadline, when one applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApprovalWarning {
    pub remove_after: Option<Duration>,
}

/// Why the object needs attention during slush or freeze.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttentionWarning {
    /// The in-progress status label is missing.
    pub missing_status: bool,
    /// A blocker has gone quiet; last activity at this time.
    pub stale_since: Option<DateTime<Utc>>,
}

/// Why the object is being removed from the milestone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemovalNotice {
    /// The label grace period expired with the triad still incomplete.
    IncompleteLabels { errors: Vec<String> },
    /// The approval grace period expired without approval.
    Unapproved,
    /// Code freeze is in effect and the object is not a blocker.
    NonBlockerFreeze,
}

/// Everything decided about one object on one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub state: MilestoneState,
    pub summary: Option<LabelSummary>,
    pub labeling: Option<LabelingWarning>,
    pub approval: Option<ApprovalWarning>,
    pub attention: Option<AttentionWarning>,
    /// Remind that blockers must be updated on the phase cadence.
    pub update_reminder: bool,
    /// Remind that non-blockers are removed once code freeze begins.
    pub freeze_reminder: bool,
    pub removal: Option<RemovalNotice>,
}

impl Decision {
    fn compliant() -> Self {
        Self {
            state: MilestoneState::Current,
            summary: None,
            labeling: None,
            approval: None,
            attention: None,
            update_reminder: false,
            freeze_reminder: false,
            removal: None,
        }
    }
}

/// Decide what must happen to keep the object compliant.
///
/// The same facts, policy, phase, and clock always produce the same
/// decision, so repeated runs over an unchanged object converge.
#[must_use]
pub fn evaluate(
    facts: &IssueFacts,
    config: &MaintainerConfig,
    phase: Phase,
    now: DateTime<Utc>,
) -> Decision {
    let mut decision = Decision::compliant();
    let issue = &facts.issue;
    let is_blocker = issue.has_label(labels::BLOCKER_LABEL);

    let check = check_labels(&issue.labels);
    let Some((kind, priority, sig_labels)) = check.triad() else {
        // Incomplete triad: warn inside the grace period, remove past it.
        let remaining = grace_period_remaining(
            facts,
            labels::INCOMPLETE_LABELS_LABEL,
            config.label_grace_period,
            now,
            is_blocker,
            now,
        );
        if remaining.is_some_and(|r| r < Duration::zero()) {
            decision.state = MilestoneState::NeedsRemoval;
            decision.removal = Some(RemovalNotice::IncompleteLabels {
                errors: check.errors.clone(),
            });
        } else {
            decision.state = MilestoneState::NeedsLabeling;
            decision.labeling = Some(LabelingWarning {
                errors: check.errors.clone(),
                remove_after: remaining.filter(|r| *r > Duration::zero()),
            });
        }
        return decision;
    };

    decision.summary = Some(LabelSummary {
        kind,
        priority,
        sig_labels: sig_labels.to_vec(),
    });

    if !issue.has_label(labels::STATUS_APPROVED_LABEL) {
        if is_blocker {
            // Blockers are warned indefinitely, never removed.
            decision.state = MilestoneState::NeedsApproval;
            decision.approval = Some(ApprovalWarning { remove_after: None });
        } else {
            let remaining = grace_period_remaining(
                facts,
                labels::NEEDS_APPROVAL_LABEL,
                config.approval_grace_period,
                now,
                false,
                now,
            );
            if remaining.is_some_and(|r| r < Duration::zero()) {
                decision.state = MilestoneState::NeedsRemoval;
                decision.removal = Some(RemovalNotice::Unapproved);
            } else {
                decision.state = MilestoneState::NeedsApproval;
                decision.approval = Some(ApprovalWarning {
                    remove_after: remaining.filter(|r| *r > Duration::zero()),
                });
            }
        }
        return decision;
    }

    match phase {
        Phase::Dev => {}
        Phase::Freeze if !is_blocker => {
            decision.state = MilestoneState::NeedsRemoval;
            decision.removal = Some(RemovalNotice::NonBlockerFreeze);
        }
        Phase::Slush | Phase::Freeze => {
            let mut attention = AttentionWarning {
                missing_status: false,
                stale_since: None,
            };
            if !issue.has_label(labels::STATUS_IN_PROGRESS_LABEL) {
                attention.missing_status = true;
                decision.state = MilestoneState::NeedsAttention;
            }
            if is_blocker {
                if let Some(interval) = config.update_interval(phase) {
                    let last_update = last_modification_time(facts);
                    if now - last_update > interval {
                        attention.stale_since = Some(last_update);
                        decision.state = MilestoneState::NeedsAttention;
                    } else {
                        decision.update_reminder = true;
                    }
                }
            } else {
                // Only slush reaches here; freeze non-blockers were
                // removed above.
                decision.freeze_reminder = true;
            }
            if attention.missing_status || attention.stale_since.is_some() {
                decision.attention = Some(attention);
            }
        }
    }

    decision
}
