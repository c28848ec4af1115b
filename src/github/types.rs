use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A pull request returned by the issue search endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequest {
    pub title: String,
    pub html_url: String,
    /// ISO-8601 timestamp, kept as the API returned it.
    pub created_at: String,
}

/// Envelope of `GET /search/issues`.
#[derive(Debug, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub items: Vec<PullRequest>,
}

/// A repository owned by a user.
#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    pub name: String,
    pub html_url: String,
}

/// An open pull request as listed by `GET /repos/{owner}/{repo}/pulls`.
#[derive(Debug, Clone, Deserialize)]
pub struct OpenPullRequest {
    pub title: String,
    pub html_url: String,
    /// Null while GitHub is still computing mergeability.
    pub merge_commit_sha: Option<String>,
}

/// Partial schema of `GET /repos/{owner}/{repo}/actions/workflows`.
#[derive(Debug, Deserialize)]
pub struct WorkflowList {
    pub total_count: u64,
}

/// Partial schema of `GET /repos/{owner}/{repo}/commits/{ref}/status`.
#[derive(Debug, Deserialize)]
pub struct CombinedStatus {
    pub state: String,
}

/// `.` and `..` are never valid GitHub user, owner or repository names.
pub fn is_dot_segment(s: &str) -> bool {
    s == "." || s == ".."
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid repository '{0}', expected <owner>/<name>")]
pub struct InvalidRepoSlug(pub String);

/// A validated `owner/name` repository identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoSlug {
    pub owner: String,
    pub name: String,
}

impl FromStr for RepoSlug {
    type Err = InvalidRepoSlug;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidRepoSlug(s.to_string());
        let (owner, name) = s.trim().split_once('/').ok_or_else(invalid)?;
        if owner.is_empty()
            || name.is_empty()
            || name.contains('/')
            || is_dot_segment(owner)
            || is_dot_segment(name)
        {
            return Err(invalid());
        }
        Ok(RepoSlug {
            owner: owner.to_string(),
            name: name.to_string(),
        })
    }
}

impl fmt::Display for RepoSlug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}
