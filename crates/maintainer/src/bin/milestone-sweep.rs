//! Batch sweep over every milestone the policy targets.
//!
//! Lists the open objects assigned to each configured milestone and
//! reconciles them one at a time. Per-object failures are logged and do
//! not abort the sweep; the run is safe to repeat at any time.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{debug, error, info, warn};

use maintainer::{MaintainerConfig, MilestoneReconciler, ReconcileOutcome};
use tracker::{DryRunTracker, GitHubClient, IssueTracker};

/// Keeps issues and PRs compliant with the milestone release process
#[derive(Parser)]
#[command(name = "milestone-sweep")]
#[command(about = "Keeps issues and PRs compliant with the milestone release process")]
#[command(version)]
struct Cli {
    /// Perform all reads but only log the writes that would happen
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    dry_run: bool,

    /// GitHub API endpoint
    #[arg(long, default_value = "https://api.github.com")]
    github_endpoint: String,

    /// Path to a file containing the GitHub OAuth token
    #[arg(long)]
    github_token_file: Option<PathBuf>,

    /// GitHub OAuth token; a token file takes precedence
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    github_token: Option<String>,

    /// Organization that owns the swept repository
    #[arg(long)]
    org: String,

    /// Repository to sweep
    #[arg(long)]
    repo: String,

    /// Path to the milestone policy file (TOML)
    #[arg(long, default_value = "milestones.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,maintainer=debug".to_string()),
        )
        .init();

    let cli = Cli::parse();

    let token = resolve_token(&cli)?;
    let config = MaintainerConfig::load(&cli.config)
        .with_context(|| format!("invalid policy file {}", cli.config.display()))?;
    info!(
        milestones = config.modes.len(),
        config = %cli.config.display(),
        "Loaded milestone policy"
    );

    let client = GitHubClient::new(&cli.github_endpoint, &token)
        .context("failed to build GitHub client")?;
    let tracker: Box<dyn IssueTracker> = if cli.dry_run {
        warn!("Dry run: no changes will be made to GitHub");
        Box::new(DryRunTracker::new(client))
    } else {
        Box::new(client)
    };
    let reconciler = MilestoneReconciler::new(tracker.as_ref(), &config);

    let mut reconciled = 0_usize;
    let mut skipped = 0_usize;
    let mut failed = 0_usize;

    for (milestone, phase) in &config.modes {
        info!(milestone = %milestone, phase = %phase, "Sweeping milestone");
        let issues = match tracker
            .list_milestone_issues(&cli.org, &cli.repo, milestone)
            .await
        {
            Ok(issues) => issues,
            Err(err) => {
                error!(milestone = %milestone, error = %err, "Failed to list milestone objects");
                failed += 1;
                continue;
            }
        };
        info!(milestone = %milestone, count = issues.len(), "Listed open objects");

        for issue in issues {
            match reconciler.reconcile(&cli.org, &cli.repo, &issue).await {
                Ok(ReconcileOutcome::Reconciled { state }) => {
                    info!(number = issue.number, state = ?state, "Reconciled");
                    reconciled += 1;
                }
                Ok(ReconcileOutcome::Skipped(reason)) => {
                    debug!(number = issue.number, reason = ?reason, "Skipped");
                    skipped += 1;
                }
                Err(err) => {
                    error!(number = issue.number, error = %err, "Failed to reconcile object");
                    failed += 1;
                }
            }
        }
    }

    info!(reconciled, skipped, failed, "Sweep complete");
    Ok(())
}

/// A token file wins over the environment; either must be non-empty.
fn resolve_token(cli: &Cli) -> Result<String> {
    if let Some(path) = &cli.github_token_file {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("could not read token file {}", path.display()))?;
        let token = raw.trim();
        if token.is_empty() {
            bail!("token file {} is empty", path.display());
        }
        return Ok(token.to_string());
    }
    if let Some(token) = &cli.github_token {
        if !token.is_empty() {
            return Ok(token.clone());
        }
    }
    bail!("a GitHub token is required (--github-token-file or GITHUB_TOKEN)")
}
