use colored::Colorize;
use std::io::Write;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::github::{PullRequest, RepoSlug, Repository};
use crate::pr::{PullRequestWithStatus, StatusOutcome};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to write report: {0}")]
    Write(#[from] std::io::Error),
}

/// Print a user's latest pull requests, one line each.
pub fn write_latest_prs(out: &mut impl Write, prs: &[PullRequest]) -> Result<(), ReportError> {
    if prs.is_empty() {
        writeln!(out, "No PRs to show.")?;
        return Ok(());
    }
    for pr in prs {
        writeln!(
            out,
            "PR Title: {}, URL: {}, Created At: {}",
            pr.title, pr.html_url, pr.created_at
        )?;
    }
    Ok(())
}

/// Print a user's repositories, one line each.
pub fn write_repos(
    out: &mut impl Write,
    user: &str,
    repos: &[Repository],
) -> Result<(), ReportError> {
    if repos.is_empty() {
        writeln!(out, "No repositories found for user: {}", user)?;
        return Ok(());
    }
    for repo in repos {
        writeln!(out, "Repo Name: {}, URL: {}", repo.name, repo.html_url)?;
    }
    Ok(())
}

/// Print whether `repo` has any GitHub Actions workflow.
pub fn write_pipeline(
    out: &mut impl Write,
    repo: &RepoSlug,
    total_count: u64,
) -> Result<(), ReportError> {
    if total_count > 0 {
        writeln!(
            out,
            "Pipeline exists for repo: {}, total count: {}",
            repo, total_count
        )?;
    } else {
        writeln!(
            out,
            "No pipeline found for repo: {}, total count: {}",
            repo, total_count
        )?;
    }
    Ok(())
}

/// Print the resolved CI status of each open pull request, in the order given.
///
/// When `color` is set the status label is colorized for terminal output.
#[instrument(skip(out, prs), fields(repo = %repo, prs = prs.len()))]
pub fn write_pr_statuses(
    out: &mut impl Write,
    repo: &RepoSlug,
    prs: &[PullRequestWithStatus],
    color: bool,
) -> Result<(), ReportError> {
    if prs.is_empty() {
        writeln!(out, "No open PRs for repo: {}", repo)?;
        return Ok(());
    }
    for pr in prs {
        debug!(pr = %pr.title, reference = ?pr.reference, status = %pr.status, "writing status line");
        let status = if color {
            colorize_status(pr.status).to_string()
        } else {
            pr.status.to_string()
        };
        writeln!(
            out,
            "PR Title: {}, Status: {}, URL: {}",
            pr.title, status, pr.html_url
        )?;
    }
    Ok(())
}

fn colorize_status(status: StatusOutcome) -> colored::ColoredString {
    let label = status.to_string();
    match status {
        StatusOutcome::Green => label.green().bold(),
        StatusOutcome::Red => label.red().bold(),
        StatusOutcome::NotRun => label.yellow(),
        StatusOutcome::Unknown => label.dimmed(),
        StatusOutcome::Error => label.magenta().bold(),
    }
}
