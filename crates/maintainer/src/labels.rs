//! Label taxonomy for milestone governance.
//!
//! The kind and priority sets are closed enumerations: an object must carry
//! exactly one label from each, and carrying more than one is ambiguous and
//! treated the same as carrying none. SIG ownership is prefix-based and an
//! object may (and should) carry several.

use tracker::Label;

/// Kind classification for objects in a release milestone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Bug,
    Cleanup,
    Feature,
}

impl Kind {
    /// All kinds, ordered by label name.
    pub const ALL: [Self; 3] = [Self::Bug, Self::Cleanup, Self::Feature];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Bug => "kind/bug",
            Self::Cleanup => "kind/cleanup",
            Self::Feature => "kind/feature",
        }
    }

    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Bug => "Fixes a bug discovered during the current release.",
            Self::Cleanup => "Adding tests, refactoring, fixing old bugs.",
            Self::Feature => "New functionality.",
        }
    }

    #[must_use]
    pub fn from_label(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.label().eq_ignore_ascii_case(name))
    }
}

/// Priority classification for objects in a release milestone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    CriticalUrgent,
    ImportantLongterm,
    ImportantSoon,
}

impl Priority {
    /// All priorities, ordered by label name.
    pub const ALL: [Self; 3] = [
        Self::CriticalUrgent,
        Self::ImportantLongterm,
        Self::ImportantSoon,
    ];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::CriticalUrgent => "priority/critical-urgent",
            Self::ImportantLongterm => "priority/important-longterm",
            Self::ImportantSoon => "priority/important-soon",
        }
    }

    /// Escalation policy for this priority, phrased for an `issue` or a
    /// `pull request`.
    #[must_use]
    pub fn description(self, obj_type: &str) -> String {
        match self {
            Self::CriticalUrgent => format!(
                "Never automatically move {obj_type} out of a release milestone; continually escalate to contributor and SIG through all available channels."
            ),
            Self::ImportantLongterm => format!(
                "Escalate to the {obj_type} owners; move out of the milestone after 1 attempt."
            ),
            Self::ImportantSoon => format!(
                "Escalate to the {obj_type} owners and SIG owner; move out of milestone after several unsuccessful escalation attempts."
            ),
        }
    }

    #[must_use]
    pub fn from_label(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|priority| priority.label().eq_ignore_ascii_case(name))
    }
}

/// Objects with this label are never automatically removed from a milestone.
pub const BLOCKER_LABEL: &str = Priority::CriticalUrgent.label();

/// Applied by operators to admit an object into the milestone. Never
/// touched by the reconciler.
pub const STATUS_APPROVED_LABEL: &str = "status/approved-for-milestone";

/// Marks an object as actively worked on during slush/freeze.
pub const STATUS_IN_PROGRESS_LABEL: &str = "status/in-progress";

/// Prefix identifying SIG ownership labels.
pub const SIG_LABEL_PREFIX: &str = "sig/";

pub const INCOMPLETE_LABELS_LABEL: &str = "milestone/incomplete-labels";
pub const NEEDS_APPROVAL_LABEL: &str = "milestone/needs-approval";
pub const NEEDS_ATTENTION_LABEL: &str = "milestone/needs-attention";
pub const REMOVED_LABEL: &str = "milestone/removed";

/// The mutually exclusive state labels managed by the reconciler. At most
/// one may be present on an object at any time.
pub const MILESTONE_STATE_LABELS: [&str; 4] = [
    INCOMPLETE_LABELS_LABEL,
    NEEDS_APPROVAL_LABEL,
    NEEDS_ATTENTION_LABEL,
    REMOVED_LABEL,
];

/// Result of validating the kind/priority/sig label triad.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelCheck {
    /// The single matching kind, if unambiguous.
    pub kind: Option<Kind>,
    /// The single matching priority, if unambiguous.
    pub priority: Option<Priority>,
    /// Every sig-prefixed label, in the order it appears on the object.
    pub sig_labels: Vec<String>,
    /// Human-readable deficiencies in a fixed order (kind, priority, sig).
    /// Empty means the triad is complete.
    pub errors: Vec<String>,
}

impl LabelCheck {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }

    /// The resolved triad, when complete.
    #[must_use]
    pub fn triad(&self) -> Option<(Kind, Priority, &[String])> {
        if self.errors.is_empty() {
            Some((self.kind?, self.priority?, &self.sig_labels))
        } else {
            None
        }
    }
}

/// Validate an object's labels against the milestone requirements.
///
/// Error strings land verbatim in posted comments, so their content and
/// order are stable across runs.
#[must_use]
pub fn check_labels(labels: &[Label]) -> LabelCheck {
    let mut errors = Vec::new();

    let kind = unique_match(labels, Kind::from_label);
    if kind.is_none() {
        errors.push(format!(
            "_**kind**_: Must specify exactly one of {}.",
            format_label_choices(Kind::ALL.iter().map(|kind| kind.label()))
        ));
    }

    let priority = unique_match(labels, Priority::from_label);
    if priority.is_none() {
        errors.push(format!(
            "_**priority**_: Must specify exactly one of {}.",
            format_label_choices(Priority::ALL.iter().map(|priority| priority.label()))
        ));
    }

    let sig_labels: Vec<String> = labels
        .iter()
        .filter(|label| label.name.starts_with(SIG_LABEL_PREFIX))
        .map(|label| label.name.clone())
        .collect();
    if sig_labels.is_empty() {
        errors.push(format!(
            "_**sig owner**_: Must specify at least one label prefixed with `{SIG_LABEL_PREFIX}`."
        ));
    }

    LabelCheck {
        kind,
        priority,
        sig_labels,
        errors,
    }
}

/// Find the single label matching `parse`. More than one match is
/// ambiguous and reads as no match.
fn unique_match<T: Copy>(labels: &[Label], parse: impl Fn(&str) -> Option<T>) -> Option<T> {
    let mut found = None;
    for label in labels {
        if let Some(value) = parse(&label.name) {
            if found.is_some() {
                return None;
            }
            found = Some(value);
        }
    }
    found
}

/// Format a label name as inline markdown code.
#[must_use]
pub fn quote_label(label: &str) -> String {
    format!("`{label}`")
}

/// Render a choice of labels as "`a`, `b` or `c`" with stable ordering.
fn format_label_choices<'a>(labels: impl Iterator<Item = &'a str>) -> String {
    let mut quoted: Vec<String> = labels.map(quote_label).collect();
    quoted.sort();
    match quoted.len() {
        0 => String::new(),
        1 => quoted.remove(0),
        _ => {
            let last = quoted.pop().unwrap_or_default();
            format!("{} or {}", quoted.join(", "), last)
        }
    }
}
