//! Milestone policy engine.
//!
//! Keeps every open issue and pull request assigned to a managed milestone
//! compliant with the release process: a complete kind/priority/sig label
//! triad, maintainer approval, and (from code slush onward) in-progress
//! status and a fresh update cadence for release blockers. Non-compliant
//! objects are warned through a single deduplicated notification comment
//! and, once their grace period lapses, moved out of the milestone.
//!
//! The crate is split along a functional seam: [`facts`] performs all
//! tracker reads up front, [`engine`] classifies the snapshot into a
//! [`engine::Decision`], [`message`] renders the decision, and
//! [`reconcile`] applies it back through the tracker. Everything between
//! fetch and apply is deterministic given the snapshot and the clock.

pub mod activity;
pub mod config;
pub mod engine;
pub mod facts;
pub mod grace;
pub mod labels;
pub mod message;
pub mod notification;
pub mod reconcile;

pub use config::{ConfigError, MaintainerConfig, Phase};
pub use engine::{evaluate, Decision, MilestoneState, NOTIFIER_NAME};
pub use facts::IssueFacts;
pub use notification::Notification;
pub use reconcile::{MilestoneReconciler, ReconcileOutcome, SkipReason};
