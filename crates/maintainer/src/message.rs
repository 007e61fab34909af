//! Rendering decisions into notification comments.
//!
//! The renderer is a pure function of the decision plus the policy, so the
//! reconciler can compare the freshly rendered notification against the
//! posted one structurally. Section texts and ordering are stable; any
//! wording change here invalidates every posted notification at once.

use chrono::Duration;

use crate::config::{MaintainerConfig, Phase};
use crate::engine::{Decision, LabelSummary, MilestoneState, RemovalNotice, NOTIFIER_NAME};
use crate::labels::{self, quote_label};
use crate::notification::Notification;

/// Help footer appended to every notification.
const HELP_DETAIL: &str = r#"<details>
<summary>Help</summary>
<ul>
 <li><a href="https://github.com/5dlabs/shepherd/blob/main/docs/milestone-process.md">Additional instructions</a></li>
 <li><a href="https://github.com/5dlabs/shepherd/blob/main/docs/commands.md">Commands for setting labels</a></li>
</ul>
</details>
"#;

fn object_type(is_pull_request: bool) -> &'static str {
    if is_pull_request {
        "pull request"
    } else {
        "issue"
    }
}

fn object_type_title(is_pull_request: bool) -> &'static str {
    if is_pull_request {
        "Pull Request"
    } else {
        "Issue"
    }
}

/// `N day`/`N days`, with the duration floored to whole days.
fn days_phrase(duration: Duration) -> String {
    let days = duration.num_hours() / 24;
    if days == 1 || days == -1 {
        format!("{days} day")
    } else {
        format!("{days} days")
    }
}

fn state_title(state: MilestoneState, is_pull_request: bool) -> String {
    let obj = object_type_title(is_pull_request);
    match state {
        MilestoneState::Current => format!("Milestone {obj} **Current**"),
        MilestoneState::NeedsLabeling => format!("Milestone {obj} Labels **Incomplete**"),
        MilestoneState::NeedsApproval => format!("Milestone {obj} **Needs Approval**"),
        MilestoneState::NeedsAttention => format!("Milestone {obj} **Needs Attention**"),
        MilestoneState::NeedsRemoval => format!("Milestone **Removed** From {obj}"),
    }
}

/// Build the full notification for a decision: the state title as the
/// arguments line, the rendered body plus help footer as the context.
#[must_use]
pub fn render_notification(
    decision: &Decision,
    config: &MaintainerConfig,
    milestone: &str,
    phase: Phase,
    is_pull_request: bool,
) -> Notification {
    let body = render_body(decision, config, milestone, phase, is_pull_request);
    let context = format!("{body}\n{HELP_DETAIL}");
    Notification::new(
        NOTIFIER_NAME,
        &state_title(decision.state, is_pull_request),
        &context,
    )
}

/// Render the message body for a decision.
///
/// Sections appear in a fixed order, separated by blank lines; the label
/// summary attaches last with a single newline. When the object is being
/// removed, only removal sections render.
#[must_use]
pub fn render_body(
    decision: &Decision,
    config: &MaintainerConfig,
    milestone: &str,
    phase: Phase,
    is_pull_request: bool,
) -> String {
    let obj = object_type(is_pull_request);
    let removing = decision.state == MilestoneState::NeedsRemoval;
    let mut sections: Vec<String> = Vec::new();

    if !removing {
        if let Some(approval) = &decision.approval {
            let mut text = format!(
                "**Action required**: This {obj} must have the {} label applied by a SIG maintainer.",
                quote_label(labels::STATUS_APPROVED_LABEL)
            );
            if let Some(remove_after) = approval.remove_after {
                text.push_str(&format!(
                    " If the label is not applied within {}, the {obj} will be moved out of the {milestone} milestone.",
                    days_phrase(remove_after)
                ));
            }
            sections.push(text);
        }
    }

    if matches!(decision.removal, Some(RemovalNotice::Unapproved)) {
        sections.push(format!(
            "**Important**: This {obj} was missing the {} label for more than {}.",
            quote_label(labels::STATUS_APPROVED_LABEL),
            days_phrase(config.approval_grace_period)
        ));
    }

    if !removing {
        if let Some(attention) = &decision.attention {
            if attention.missing_status {
                sections.push(format!(
                    "**Action required**: During code {phase}, {obj}s in the milestone should be in progress.\n\
                     If this {obj} is not being actively worked on, please remove it from the milestone.\n\
                     If it is being worked on, please add the {} label so it can be tracked with other in-flight {obj}s.",
                    quote_label(labels::STATUS_IN_PROGRESS_LABEL)
                ));
            }
            if let Some(stale_since) = attention.stale_since {
                sections.push(format!(
                    "**Action Required**: This {obj} has not been updated since {}. Please provide an update.",
                    stale_since.format("%b %-d")
                ));
            }
        }

        if decision.update_reminder {
            if let Some(interval) = config.update_interval(phase) {
                sections.push(format!(
                    "**Note**: This {obj} is marked as {}, and must be updated every {} during code {phase}.\n\n\
                     Example update:\n\n\
                     ```\n\
                     ACK.  In progress\n\
                     ETA: DD/MM/YYYY\n\
                     Risks: Complicated fix required\n\
                     ```",
                    quote_label(labels::BLOCKER_LABEL),
                    days_phrase(interval)
                ));
            }
        }

        if decision.freeze_reminder {
            sections.push(format!(
                "**Note**: If this {obj} is not resolved or labeled as {} by {} it will be moved out of the {milestone} milestone.",
                quote_label(labels::BLOCKER_LABEL),
                config.freeze_date
            ));
        }
    }

    if matches!(decision.removal, Some(RemovalNotice::NonBlockerFreeze)) {
        sections.push(format!(
            "**Important**: Code freeze is in effect and only {obj}s with {} may remain in the {milestone} milestone.",
            quote_label(labels::BLOCKER_LABEL)
        ));
    }

    if !removing {
        if let Some(labeling) = &decision.labeling {
            let mut text = format!("**Action required**: This {obj} requires label changes.");
            if let Some(remove_after) = labeling.remove_after {
                text.push_str(&format!(
                    " If the required changes are not made within {}, the {obj} will be moved out of the {milestone} milestone.",
                    days_phrase(remove_after)
                ));
            }
            text.push_str("\n\n");
            text.push_str(&labeling.errors.join("\n"));
            sections.push(text);
        }
    }

    if let Some(RemovalNotice::IncompleteLabels { errors }) = &decision.removal {
        sections.push(format!(
            "**Important**: This {obj} was missing labels required for the {milestone} milestone for more than {}:\n\n{}",
            days_phrase(config.label_grace_period),
            errors.join("\n")
        ));
    }

    let mut body = sections.join("\n\n");

    if !removing {
        if let Some(summary) = &decision.summary {
            let details = render_summary(
                summary,
                decision.state == MilestoneState::Current,
                is_pull_request,
            );
            if body.is_empty() {
                body = details;
            } else {
                body = format!("{body}\n{details}");
            }
        }
    }

    body
}

/// The collapsible label summary. Expanded only when it is the whole
/// message.
fn render_summary(summary: &LabelSummary, only_summary: bool, is_pull_request: bool) -> String {
    let obj_title = object_type_title(is_pull_request);
    let obj = object_type(is_pull_request);
    let open_attr = if only_summary { " open" } else { "" };
    let sig_list = summary
        .sig_labels
        .iter()
        .map(|sig| quote_label(sig))
        .collect::<Vec<_>>()
        .join(" ");

    format!(
        "<details{open_attr}>\n\
         <summary>{obj_title} Labels</summary>\n\n\
         - {sig_list}: {obj_title} will be escalated to these SIGs if needed.\n\
         - {}: {}\n\
         - {}: {}\n\
         </details>",
        quote_label(summary.priority.label()),
        summary.priority.description(obj),
        quote_label(summary.kind.label()),
        summary.kind.description()
    )
}
