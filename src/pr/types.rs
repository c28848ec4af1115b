use std::fmt;

use crate::github::OpenPullRequest;

/// Local CI outcome of a pull request, derived from GitHub's combined
/// commit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusOutcome {
    Green,
    Red,
    NotRun,
    Unknown,
    /// The status could not be fetched or decoded.
    Error,
}

impl StatusOutcome {
    /// Map a combined-status `state` string onto a local outcome.
    pub fn from_state(state: &str) -> Self {
        match state {
            "success" => StatusOutcome::Green,
            "failure" => StatusOutcome::Red,
            "pending" => StatusOutcome::NotRun,
            _ => StatusOutcome::Unknown,
        }
    }
}

impl fmt::Display for StatusOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusOutcome::Green => write!(f, "green"),
            StatusOutcome::Red => write!(f, "red"),
            StatusOutcome::NotRun => write!(f, "not-run"),
            StatusOutcome::Unknown => write!(f, "unknown"),
            StatusOutcome::Error => write!(f, "error"),
        }
    }
}

/// An open pull request together with its resolved CI outcome.
///
/// The status is fixed at construction; nothing re-derives it afterwards.
#[derive(Debug, Clone)]
pub struct PullRequestWithStatus {
    pub title: String,
    pub html_url: String,
    /// Merge commit SHA the status was resolved for.
    pub reference: Option<String>,
    pub status: StatusOutcome,
}

impl PullRequestWithStatus {
    pub fn new(pr: OpenPullRequest, status: StatusOutcome) -> Self {
        Self {
            title: pr.title,
            html_url: pr.html_url,
            reference: pr.merge_commit_sha,
            status,
        }
    }
}
