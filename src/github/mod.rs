pub mod transport;
pub mod types;

pub use transport::{HttpTransport, Transport, TransportError};
pub use types::{
    is_dot_segment, CombinedStatus, OpenPullRequest, PullRequest, RepoSlug, Repository,
};

use reqwest::Url;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, instrument};

use types::{SearchResult, WorkflowList};

pub const DEFAULT_API_URL: &str = "https://api.github.com";

#[derive(Debug, Error)]
pub enum GitHubError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("error unmarshalling {what} JSON: {source}")]
    Decode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Typed access to the handful of GitHub REST endpoints the tool reads.
///
/// Paths are assembled segment by segment, so user-supplied names are
/// percent-encoded and can never change the host. Empty, `.` and `..`
/// segments are refused so they cannot change the path layout either.
#[derive(Clone)]
pub struct GitHub {
    transport: Arc<dyn Transport>,
    base_url: Url,
}

impl GitHub {
    /// Client for `https://api.github.com`.
    pub fn new(transport: Arc<dyn Transport>) -> Result<Self, GitHubError> {
        let base_url = Url::parse(DEFAULT_API_URL).map_err(|e| TransportError::InvalidUrl {
            url: DEFAULT_API_URL.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            transport,
            base_url,
        })
    }

    #[cfg(test)]
    pub fn with_base_url(transport: Arc<dyn Transport>, base_url: Url) -> Self {
        Self {
            transport,
            base_url,
        }
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, GitHubError> {
        // `extend` drops "." and ".." silently, which would shift the path.
        if let Some(bad) = segments.iter().find(|s| s.is_empty() || is_dot_segment(s)) {
            return Err(TransportError::InvalidUrl {
                url: segments.join("/"),
                reason: format!("path segment '{}' is not allowed", bad),
            }
            .into());
        }

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| TransportError::InvalidUrl {
                url: self.base_url.to_string(),
                reason: "URL cannot be used as a base".to_string(),
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: Url,
        what: &'static str,
    ) -> Result<T, GitHubError> {
        let body = self.transport.get(url.as_str()).await?;
        serde_json::from_slice(&body).map_err(|source| GitHubError::Decode { what, source })
    }

    /// Latest pull requests authored by `user` across all repositories,
    /// newest first. `limit` is passed as the page size.
    #[instrument(skip(self))]
    pub async fn latest_prs_by_user(
        &self,
        user: &str,
        limit: u32,
    ) -> Result<Vec<PullRequest>, GitHubError> {
        let mut url = self.endpoint(&["search", "issues"])?;
        url.query_pairs_mut()
            .append_pair("q", &format!("author:{} type:pr", user))
            .append_pair("sort", "created")
            .append_pair("order", "desc")
            .append_pair("per_page", &limit.to_string());

        let result: SearchResult = self.get_json(url, "PR search").await?;
        debug!(count = result.items.len(), "received PR search results");
        Ok(result.items)
    }

    /// Repositories owned by `user`.
    #[instrument(skip(self))]
    pub async fn user_repos(&self, user: &str) -> Result<Vec<Repository>, GitHubError> {
        let url = self.endpoint(&["users", user, "repos"])?;
        let repos: Vec<Repository> = self.get_json(url, "repo").await?;
        debug!(count = repos.len(), "received repositories");
        Ok(repos)
    }

    /// Number of GitHub Actions workflows defined for `repo`.
    #[instrument(skip(self), fields(repo = %repo))]
    pub async fn workflow_count(&self, repo: &RepoSlug) -> Result<u64, GitHubError> {
        let url = self.endpoint(&["repos", &repo.owner, &repo.name, "actions", "workflows"])?;
        let list: WorkflowList = self.get_json(url, "pipeline").await?;
        Ok(list.total_count)
    }

    /// Open pull requests of `repo`, in the order GitHub lists them.
    #[instrument(skip(self), fields(repo = %repo))]
    pub async fn open_pull_requests(
        &self,
        repo: &RepoSlug,
    ) -> Result<Vec<OpenPullRequest>, GitHubError> {
        let mut url = self.endpoint(&["repos", &repo.owner, &repo.name, "pulls"])?;
        url.query_pairs_mut().append_pair("state", "open");
        self.get_json(url, "pull request").await
    }

    /// Combined commit status for `reference` in `repo`.
    pub async fn combined_status(
        &self,
        repo: &RepoSlug,
        reference: &str,
    ) -> Result<CombinedStatus, GitHubError> {
        let url = self.endpoint(&[
            "repos",
            &repo.owner,
            &repo.name,
            "commits",
            reference,
            "status",
        ])?;
        self.get_json(url, "commit status").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn client_for(server: &Server) -> GitHub {
        let base_url = Url::parse(&server.url()).unwrap();
        let transport = HttpTransport::for_server(None, &base_url);
        GitHub::with_base_url(Arc::new(transport), base_url)
    }

    fn repo() -> RepoSlug {
        "octocat/hello-world".parse().unwrap()
    }

    #[test]
    fn test_endpoint_encodes_user_input() {
        let github = GitHub::new(Arc::new(HttpTransport::new(None))).unwrap();
        let url = github.endpoint(&["users", "evil.com/x?y", "repos"]).unwrap();
        assert_eq!(url.host_str(), Some(transport::DEFAULT_API_HOST));
        assert_eq!(url.path(), "/users/evil.com%2Fx%3Fy/repos");
        assert!(url.query().is_none());
    }

    #[test]
    fn test_endpoint_rejects_dot_segments() {
        let github = GitHub::new(Arc::new(HttpTransport::new(None))).unwrap();
        assert!(github.endpoint(&["users", "..", "repos"]).is_err());
        assert!(github.endpoint(&["repos", ".", "x", "pulls"]).is_err());
        assert!(github.endpoint(&["users", "", "repos"]).is_err());
    }

    #[tokio::test]
    async fn test_user_repos_dot_dot_makes_no_request() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let err = client_for(&server).user_repos("..").await.unwrap_err();
        assert!(matches!(
            err,
            GitHubError::Transport(TransportError::InvalidUrl { .. })
        ));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_user_repos_empty_listing() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/users/octocat/repos")
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let repos = client_for(&server).user_repos("octocat").await.unwrap();
        assert!(repos.is_empty());
    }

    #[tokio::test]
    async fn test_user_repos_decodes_listing() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/users/octocat/repos")
            .with_status(200)
            .with_body(
                r#"[{"id":1,"name":"hello-world","html_url":"https://github.com/octocat/hello-world","fork":false}]"#,
            )
            .create_async()
            .await;

        let repos = client_for(&server).user_repos("octocat").await.unwrap();
        assert_eq!(repos.len(), 1);
        assert_eq!(repos[0].name, "hello-world");
        assert_eq!(repos[0].html_url, "https://github.com/octocat/hello-world");
    }

    #[tokio::test]
    async fn test_user_repos_malformed_json_is_decode_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/users/octocat/repos")
            .with_status(200)
            .with_body(r#"{"message":"unexpected"}"#)
            .create_async()
            .await;

        let err = client_for(&server).user_repos("octocat").await.unwrap_err();
        assert!(matches!(err, GitHubError::Decode { what: "repo", .. }));
    }

    #[tokio::test]
    async fn test_latest_prs_by_user_sends_search_query() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/search/issues")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("q".into(), "author:octocat type:pr".into()),
                Matcher::UrlEncoded("sort".into(), "created".into()),
                Matcher::UrlEncoded("order".into(), "desc".into()),
                Matcher::UrlEncoded("per_page".into(), "5".into()),
            ]))
            .with_status(200)
            .with_body(
                r#"{"total_count":1,"items":[{"title":"Add docs","html_url":"https://github.com/o/r/pull/7","created_at":"2024-09-07T10:00:00Z"}]}"#,
            )
            .create_async()
            .await;

        let prs = client_for(&server)
            .latest_prs_by_user("octocat", 5)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(prs.len(), 1);
        assert_eq!(prs[0].title, "Add docs");
    }

    #[tokio::test]
    async fn test_workflow_count() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/repos/octocat/hello-world/actions/workflows")
            .with_status(200)
            .with_body(r#"{"total_count":3,"workflows":[{"id":1},{"id":2},{"id":3}]}"#)
            .create_async()
            .await;

        let count = client_for(&server).workflow_count(&repo()).await.unwrap();
        assert_eq!(count, 3);
    }

    #[tokio::test]
    async fn test_workflow_count_zero_with_extra_fields() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/repos/octocat/hello-world/actions/workflows")
            .with_status(200)
            .with_body(r#"{"total_count":0,"workflows":[],"page":1}"#)
            .create_async()
            .await;

        let count = client_for(&server).workflow_count(&repo()).await.unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_open_pull_requests_and_status() {
        let mut server = Server::new_async().await;
        let _pulls = server
            .mock("GET", "/repos/octocat/hello-world/pulls")
            .match_query(Matcher::UrlEncoded("state".into(), "open".into()))
            .with_status(200)
            .with_body(
                r#"[{"title":"A","html_url":"https://github.com/o/r/pull/1","merge_commit_sha":"abc"},
                    {"title":"B","html_url":"https://github.com/o/r/pull/2","merge_commit_sha":null}]"#,
            )
            .create_async()
            .await;
        let _status = server
            .mock("GET", "/repos/octocat/hello-world/commits/abc/status")
            .with_status(200)
            .with_body(r#"{"state":"success","total_count":1}"#)
            .create_async()
            .await;

        let github = client_for(&server);
        let prs = github.open_pull_requests(&repo()).await.unwrap();
        assert_eq!(prs.len(), 2);
        assert_eq!(prs[0].merge_commit_sha.as_deref(), Some("abc"));
        assert!(prs[1].merge_commit_sha.is_none());

        let status = github.combined_status(&repo(), "abc").await.unwrap();
        assert_eq!(status.state, "success");
    }

    #[tokio::test]
    async fn test_listing_failure_surfaces_transport_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/repos/octocat/hello-world/pulls")
            .match_query(Matcher::Any)
            .with_status(500)
            .create_async()
            .await;

        let err = client_for(&server)
            .open_pull_requests(&repo())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            GitHubError::Transport(TransportError::Status { .. })
        ));
    }
}
