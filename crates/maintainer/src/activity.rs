//! Staleness detection: when did a human last touch the object?

use chrono::{DateTime, Utc};

use crate::facts::IssueFacts;

/// Most recent interesting activity on the object.
///
/// Considers creation, the latest update to any non-bot comment or review
/// comment, and the latest reopen. Bot-authored comments are excluded so
/// the engine's own notifications never reset the staleness clock.
#[must_use]
pub fn last_modification_time(facts: &IssueFacts) -> DateTime<Utc> {
    let mut last = facts.issue.created_at;

    for comment in facts.comments.iter().chain(&facts.review_comments) {
        if comment.user.login == facts.bot_login {
            continue;
        }
        last = last.max(comment.updated_at);
    }

    for event in &facts.events {
        if event.event == "reopened" {
            last = last.max(event.created_at);
        }
    }

    last
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tracker::{Comment, Issue, IssueEvent, User};

    const BOT: &str = "shepherd-bot";

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap()
    }

    fn comment(author: &str, updated_at: DateTime<Utc>) -> Comment {
        Comment {
            id: 1,
            user: User {
                login: author.to_string(),
            },
            body: "hello".to_string(),
            created_at: updated_at,
            updated_at,
        }
    }

    fn facts(created_at: DateTime<Utc>) -> IssueFacts {
        IssueFacts {
            org: "acme".to_string(),
            repo: "widgets".to_string(),
            issue: Issue {
                number: 9,
                state: "open".to_string(),
                title: "test".to_string(),
                labels: Vec::new(),
                milestone: None,
                created_at,
                pull_request: None,
            },
            comments: Vec::new(),
            events: Vec::new(),
            review_comments: Vec::new(),
            bot_login: BOT.to_string(),
        }
    }

    #[test]
    fn test_creation_time_is_the_floor() {
        let facts = facts(at(1));
        assert_eq!(last_modification_time(&facts), at(1));
    }

    #[test]
    fn test_human_comments_advance_the_clock() {
        let mut facts = facts(at(1));
        facts.comments.push(comment("alice", at(3)));
        facts.comments.push(comment("bob", at(2)));
        assert_eq!(last_modification_time(&facts), at(3));
    }

    #[test]
    fn test_bot_comments_do_not_count() {
        let mut facts = facts(at(1));
        facts.comments.push(comment(BOT, at(5)));
        assert_eq!(last_modification_time(&facts), at(1));
    }

    #[test]
    fn test_review_comments_count_for_pull_requests() {
        let mut facts = facts(at(1));
        facts.review_comments.push(comment("alice", at(4)));
        assert_eq!(last_modification_time(&facts), at(4));
    }

    #[test]
    fn test_reopening_advances_the_clock() {
        let mut facts = facts(at(1));
        facts.events.push(IssueEvent {
            event: "reopened".to_string(),
            actor: None,
            label: None,
            created_at: at(6),
        });
        facts.events.push(IssueEvent {
            event: "labeled".to_string(),
            actor: None,
            label: None,
            created_at: at(8),
        });
        assert_eq!(last_modification_time(&facts), at(6));
    }
}
