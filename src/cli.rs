use clap::Parser;
use std::ffi::OsString;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::github::{is_dot_segment, RepoSlug};

/// gh-report: report a GitHub user's latest pull requests and repositories,
/// a repository's CI pipeline and the CI status of its open PRs.
#[derive(Parser, Debug)]
#[command(name = "gh-report", version, about)]
pub struct Cli {
    /// Action to perform (options: userLatestPRs, userInfoRepos, pipelineStatus, prStatus)
    #[arg(long)]
    pub action: Option<String>,

    /// GitHub username to fetch PRs and repos for
    #[arg(long)]
    pub user: Option<String>,

    /// GitHub repo (owner/name) to check pipeline and PR status
    #[arg(long)]
    pub repo: Option<String>,

    /// Number of latest PRs to fetch
    #[arg(long = "numPrs", default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..=100))]
    pub num_prs: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    UserLatestPrs,
    UserInfoRepos,
    PipelineStatus,
    PrStatus,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::UserLatestPrs => write!(f, "userLatestPRs"),
            Action::UserInfoRepos => write!(f, "userInfoRepos"),
            Action::PipelineStatus => write!(f, "pipelineStatus"),
            Action::PrStatus => write!(f, "prStatus"),
        }
    }
}

impl FromStr for Action {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "userLatestPRs" => Ok(Action::UserLatestPrs),
            "userInfoRepos" => Ok(Action::UserInfoRepos),
            "pipelineStatus" => Ok(Action::PipelineStatus),
            "prStatus" => Ok(Action::PrStatus),
            _ => Err(ValidationError::InvalidAction),
        }
    }
}

/// Missing or malformed command-line input. Nothing is requested from
/// GitHub when one of these is returned.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid action. Options are userLatestPRs, userInfoRepos, pipelineStatus, prStatus.")]
    InvalidAction,

    #[error("GitHub username is required for {0} action. Usage example: gh-report -action={0} -user=<username>")]
    MissingUser(Action),

    #[error("GitHub repo is required for {0} action. Usage example: gh-report -action={0} -repo=<owner>/<name>")]
    MissingRepo(Action),

    #[error("Invalid GitHub username '{0}'.")]
    InvalidUser(String),

    #[error("{0}")]
    InvalidRepo(#[from] crate::github::types::InvalidRepoSlug),
}

/// A fully validated invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    UserLatestPrs { user: String, num_prs: u32 },
    UserInfoRepos { user: String },
    PipelineStatus { repo: RepoSlug },
    PrStatus { repo: RepoSlug },
}

impl Cli {
    pub fn into_command(self) -> Result<Command, ValidationError> {
        let action: Action = self
            .action
            .as_deref()
            .ok_or(ValidationError::InvalidAction)?
            .parse()?;

        let user = non_blank(self.user);
        let repo = non_blank(self.repo);

        match action {
            Action::UserLatestPrs => Ok(Command::UserLatestPrs {
                user: valid_user(user, action)?,
                num_prs: self.num_prs,
            }),
            Action::UserInfoRepos => Ok(Command::UserInfoRepos {
                user: valid_user(user, action)?,
            }),
            Action::PipelineStatus => Ok(Command::PipelineStatus {
                repo: repo.ok_or(ValidationError::MissingRepo(action))?.parse()?,
            }),
            Action::PrStatus => Ok(Command::PrStatus {
                repo: repo.ok_or(ValidationError::MissingRepo(action))?.parse()?,
            }),
        }
    }
}

fn valid_user(user: Option<String>, action: Action) -> Result<String, ValidationError> {
    let user = user.ok_or(ValidationError::MissingUser(action))?;
    if is_dot_segment(&user) {
        return Err(ValidationError::InvalidUser(user));
    }
    Ok(user)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Rewrite single-dash long flags (`-action=prStatus`, `-numPrs 5`) into the
/// double-dash form clap expects. Short flags, values and everything after
/// `--` are left alone.
pub fn normalize_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut normalized = Vec::new();
    let mut passthrough = false;

    for (i, arg) in args.into_iter().enumerate() {
        let arg: OsString = arg.into();
        if i == 0 || passthrough {
            normalized.push(arg);
            continue;
        }
        match arg.to_str() {
            Some("--") => {
                passthrough = true;
                normalized.push(arg);
            }
            Some(s) if is_single_dash_long(s) => normalized.push(format!("-{}", s).into()),
            _ => normalized.push(arg),
        }
    }
    normalized
}

fn is_single_dash_long(arg: &str) -> bool {
    let Some(rest) = arg.strip_prefix('-') else {
        return false;
    };
    if rest.starts_with('-') {
        return false;
    }
    let name = rest.split_once('=').map_or(rest, |(name, _)| name);
    name.len() > 1 && name.chars().all(|c| c.is_ascii_alphabetic())
}
