//! Structured notification marker embedded in comment bodies.
//!
//! A notification serializes as `[NAME] arguments` followed by an optional
//! blank-line-separated context. The marker makes the bot's own comment
//! findable among arbitrary human comments, and structural equality between
//! parsed and freshly built notifications is what keeps reposting
//! idempotent.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// Matches a notification: `[NOTIFNAME] Arguments\n\nContext`.
static NOTIFICATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^\[([^\]\s]+)\] *?([^\n]*)(?:\n\n(.*))?").expect("notification pattern compiles")
});

/// A message maintained by the bot. Easy to find and recreate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Marker name, stored uppercased (names are case-insensitive).
    pub name: String,
    /// Single-line arguments following the marker.
    pub arguments: String,
    /// Free-form body after the first blank line.
    pub context: String,
}

impl Notification {
    /// Build a notification. The name is uppercased and the other fields
    /// trimmed so that a built notification compares equal to itself after
    /// a serialize/parse round trip.
    #[must_use]
    pub fn new(name: &str, arguments: &str, context: &str) -> Self {
        Self {
            name: name.to_uppercase(),
            arguments: arguments.trim().to_string(),
            context: context.trim().to_string(),
        }
    }

    /// Read a notification from a comment body. Returns `None` when the
    /// body does not begin with a bracketed marker.
    #[must_use]
    pub fn parse(body: &str) -> Option<Self> {
        let captures = NOTIFICATION_RE.captures(body)?;
        Some(Self::new(
            captures.get(1)?.as_str(),
            captures.get(2).map_or("", |m| m.as_str()),
            captures.get(3).map_or("", |m| m.as_str()),
        ))
    }

    /// Whether this notification carries the given marker name.
    #[must_use]
    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.name)?;
        if !self.arguments.is_empty() {
            write!(f, " {}", self.arguments)?;
        }
        if !self.context.is_empty() {
            write!(f, "\n\n{}", self.context)?;
        }
        Ok(())
    }
}
