//! Grace-period arithmetic over label-application history.

use chrono::{DateTime, Duration, Utc};

use crate::facts::IssueFacts;

/// Time remaining before the grace period tied to `label_name` expires.
///
/// Returns `None` when no removal deadline applies: blockers are never
/// auto-removed, and when the warning label is set but its application
/// event cannot be found in the history the object is treated as still
/// within grace rather than expired.
///
/// A negative result means the deadline has passed.
#[must_use]
pub fn grace_period_remaining(
    facts: &IssueFacts,
    label_name: &str,
    grace_period: Duration,
    default_start: DateTime<Utc>,
    is_blocker: bool,
    now: DateTime<Utc>,
) -> Option<Duration> {
    if is_blocker {
        return None;
    }
    let start = grace_period_start(facts, label_name, default_start)?;
    Some(start + grace_period - now)
}

/// When the grace period started: the moment the warning label was last
/// applied by the bot, or `default_start` if the label is not set yet.
fn grace_period_start(
    facts: &IssueFacts,
    label_name: &str,
    default_start: DateTime<Utc>,
) -> Option<DateTime<Utc>> {
    if !facts.issue.has_label(label_name) {
        return Some(default_start);
    }
    label_last_applied_at(facts, label_name)
}

/// Timestamp of the most recent bot-authored `labeled` event for
/// `label_name`. Events arrive oldest first, so scan from the newest end.
fn label_last_applied_at(facts: &IssueFacts, label_name: &str) -> Option<DateTime<Utc>> {
    facts
        .events
        .iter()
        .rev()
        .find(|event| event.is_label_applied_by(&facts.bot_login, label_name))
        .map(|event| event.created_at)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tracker::{Issue, IssueEvent, Label, User};

    const BOT: &str = "shepherd-bot";
    const WARNING_LABEL: &str = "milestone/incomplete-labels";

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, hour, 0, 0).unwrap()
    }

    fn labeled_event(actor: &str, label: &str, created_at: DateTime<Utc>) -> IssueEvent {
        IssueEvent {
            event: "labeled".to_string(),
            actor: Some(User {
                login: actor.to_string(),
            }),
            label: Some(Label {
                name: label.to_string(),
            }),
            created_at,
        }
    }

    fn facts(labels: &[&str], events: Vec<IssueEvent>) -> IssueFacts {
        IssueFacts {
            org: "acme".to_string(),
            repo: "widgets".to_string(),
            issue: Issue {
                number: 7,
                state: "open".to_string(),
                title: "test".to_string(),
                labels: labels
                    .iter()
                    .map(|name| Label {
                        name: (*name).to_string(),
                    })
                    .collect(),
                milestone: None,
                created_at: at(0),
                pull_request: None,
            },
            comments: Vec::new(),
            events,
            review_comments: Vec::new(),
            bot_login: BOT.to_string(),
        }
    }

    #[test]
    fn test_blockers_never_expire() {
        let facts = facts(&[WARNING_LABEL], vec![labeled_event(BOT, WARNING_LABEL, at(1))]);
        let remaining =
            grace_period_remaining(&facts, WARNING_LABEL, Duration::hours(1), at(12), true, at(12));
        assert_eq!(remaining, None);
    }

    #[test]
    fn test_unset_label_starts_from_default() {
        let facts = facts(&[], Vec::new());
        let remaining =
            grace_period_remaining(&facts, WARNING_LABEL, Duration::hours(72), at(6), false, at(6));
        assert_eq!(remaining, Some(Duration::hours(72)));
    }

    #[test]
    fn test_set_label_starts_from_bot_event() {
        let facts = facts(&[WARNING_LABEL], vec![labeled_event(BOT, WARNING_LABEL, at(2))]);
        let remaining =
            grace_period_remaining(&facts, WARNING_LABEL, Duration::hours(3), at(10), false, at(10));
        // Started at 02:00, three hour grace, evaluated at 10:00.
        assert_eq!(remaining, Some(Duration::hours(-5)));
    }

    #[test]
    fn test_last_application_event_wins() {
        let facts = facts(
            &[WARNING_LABEL],
            vec![
                labeled_event(BOT, WARNING_LABEL, at(1)),
                labeled_event(BOT, WARNING_LABEL, at(8)),
            ],
        );
        let remaining =
            grace_period_remaining(&facts, WARNING_LABEL, Duration::hours(4), at(10), false, at(10));
        assert_eq!(remaining, Some(Duration::hours(2)));
    }

    #[test]
    fn test_human_applied_events_are_ignored() {
        let facts = facts(
            &[WARNING_LABEL],
            vec![labeled_event("some-human", WARNING_LABEL, at(1))],
        );
        let remaining =
            grace_period_remaining(&facts, WARNING_LABEL, Duration::hours(4), at(10), false, at(10));
        assert_eq!(remaining, None);
    }

    #[test]
    fn test_set_label_without_history_never_expires() {
        let facts = facts(&[WARNING_LABEL], Vec::new());
        let remaining =
            grace_period_remaining(&facts, WARNING_LABEL, Duration::hours(4), at(10), false, at(10));
        assert_eq!(remaining, None);
    }

    #[test]
    fn test_remaining_crosses_zero_at_the_deadline() {
        let events = vec![labeled_event(BOT, WARNING_LABEL, at(2))];
        let deadline = at(2) + Duration::hours(6);

        let before = facts(&[WARNING_LABEL], events.clone());
        let remaining = grace_period_remaining(
            &before,
            WARNING_LABEL,
            Duration::hours(6),
            at(0),
            false,
            deadline - Duration::minutes(1),
        );
        assert!(remaining.unwrap() > Duration::zero());

        let after = facts(&[WARNING_LABEL], events);
        let remaining = grace_period_remaining(
            &after,
            WARNING_LABEL,
            Duration::hours(6),
            at(0),
            false,
            deadline + Duration::minutes(1),
        );
        assert!(remaining.unwrap() < Duration::zero());
    }
}
