//! GitHub tracker access for the milestone shepherd.
//!
//! This crate provides:
//! - Wire models for issues, comments, labels, and timeline events
//! - The [`IssueTracker`] trait the policy engine reconciles against
//! - A GitHub REST implementation with rate-limit tracking and pagination
//! - A dry-run wrapper that logs mutations instead of performing them
//!
//! All durable state lives on the tracker side; nothing here caches issue
//! data across calls (the bot login is the one exception, since it cannot
//! change within a process lifetime).

pub mod client;
pub mod error;
pub mod models;

pub use client::{DryRunTracker, GitHubClient, IssueTracker};
pub use error::TrackerError;
pub use models::{Comment, Issue, IssueEvent, Label, Milestone, PullRequestLink, SearchResults, User};
