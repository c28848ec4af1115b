pub mod types;

pub use types::{PullRequestWithStatus, StatusOutcome};

use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, info_span, instrument, warn, Instrument};

use crate::github::{GitHub, GitHubError, RepoSlug};

/// Default number of commit status lookups in flight at once.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// List the open pull requests of `repo` and resolve the CI outcome of each.
///
/// Failing to list the pull requests is an error. Failing to resolve a single
/// pull request's status is not: that entry is reported as
/// [`StatusOutcome::Error`] and the rest of the batch carries on.
///
/// At most `concurrency` status lookups run at the same time. The result is
/// always in the order GitHub listed the pull requests.
#[instrument(skip(github), fields(repo = %repo))]
pub async fn resolve_statuses(
    github: &GitHub,
    repo: &RepoSlug,
    concurrency: usize,
) -> Result<Vec<PullRequestWithStatus>, GitHubError> {
    let pulls = github.open_pull_requests(repo).await?;
    info!(open_prs = pulls.len(), "listed open pull requests");
    if pulls.is_empty() {
        return Ok(Vec::new());
    }

    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut tasks = JoinSet::new();
    for (index, pr) in pulls.iter().enumerate() {
        let github = github.clone();
        let repo = repo.clone();
        let title = pr.title.clone();
        let reference = pr.merge_commit_sha.clone();
        let semaphore = Arc::clone(&semaphore);

        tasks.spawn(
            async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    warn!("status lookup semaphore closed");
                    return (index, StatusOutcome::Error);
                };
                let outcome = resolve_one(&github, &repo, &title, reference.as_deref()).await;
                (index, outcome)
            }
            .instrument(info_span!("status_lookup", index)),
        );
    }

    // Slots stay Error if their task never reports back.
    let mut outcomes = vec![StatusOutcome::Error; pulls.len()];
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, outcome)) => outcomes[index] = outcome,
            Err(e) => warn!(error = %e, "status lookup task did not complete"),
        }
    }

    Ok(pulls
        .into_iter()
        .zip(outcomes)
        .map(|(pr, status)| PullRequestWithStatus::new(pr, status))
        .collect())
}

async fn resolve_one(
    github: &GitHub,
    repo: &RepoSlug,
    title: &str,
    reference: Option<&str>,
) -> StatusOutcome {
    let Some(reference) = reference else {
        warn!(pr = %title, "pull request has no merge commit to check");
        return StatusOutcome::Error;
    };

    match github.combined_status(repo, reference).await {
        Ok(status) => {
            debug!(pr = %title, state = %status.state, "resolved combined status");
            StatusOutcome::from_state(&status.state)
        }
        Err(e) => {
            warn!(pr = %title, error = %e, "error fetching commit status");
            StatusOutcome::Error
        }
    }
}
