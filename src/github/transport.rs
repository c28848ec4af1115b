use async_trait::async_trait;
use reqwest::header::{ACCEPT, USER_AGENT};
use reqwest::{StatusCode, Url};
use thiserror::Error;
use tracing::{debug, instrument};

/// The only host requests may target.
pub const DEFAULT_API_HOST: &str = "api.github.com";

/// The only scheme requests may use.
pub const DEFAULT_API_SCHEME: &str = "https";

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("invalid URL: requests are only allowed to {allowed}, got '{host}'")]
    DisallowedHost { host: String, allowed: String },

    #[error("invalid URL: requests must use {allowed}, got '{scheme}'")]
    DisallowedScheme { scheme: String, allowed: String },

    #[error("received non-ok http status: {status} ({url})")]
    Status { url: String, status: StatusCode },

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// A GET-only transport to the GitHub REST API.
///
/// Implementations must be Send + Sync so status lookups can fan out across
/// tokio tasks.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Fetch `url` and return the raw response body.
    ///
    /// Only an HTTP 200 counts as success.
    async fn get(&self, url: &str) -> Result<Vec<u8>, TransportError>;
}

/// `reqwest`-backed transport restricted to `https://api.github.com`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    token: Option<String>,
    allowed_scheme: String,
    allowed_host: String,
}

impl HttpTransport {
    /// An empty token is treated the same as no token.
    pub fn new(token: Option<String>) -> Self {
        Self::with_origin(token, DEFAULT_API_SCHEME, DEFAULT_API_HOST)
    }

    fn with_origin(token: Option<String>, scheme: &str, host: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            token: token.filter(|t| !t.is_empty()),
            allowed_scheme: scheme.to_string(),
            allowed_host: host.to_string(),
        }
    }

    /// Transport bound to a local mock server instead of GitHub.
    #[cfg(test)]
    pub fn for_server(token: Option<String>, base_url: &Url) -> Self {
        Self::with_origin(
            token,
            base_url.scheme(),
            base_url.host_str().unwrap_or_default(),
        )
    }

    /// Parse `url` and reject it unless scheme and host are the allowed ones.
    fn check_origin(&self, url: &str) -> Result<Url, TransportError> {
        let parsed = Url::parse(url).map_err(|e| TransportError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        if parsed.host_str() != Some(self.allowed_host.as_str()) {
            return Err(TransportError::DisallowedHost {
                host: parsed.host_str().unwrap_or_default().to_string(),
                allowed: self.allowed_host.clone(),
            });
        }
        if parsed.scheme() != self.allowed_scheme {
            return Err(TransportError::DisallowedScheme {
                scheme: parsed.scheme().to_string(),
                allowed: self.allowed_scheme.clone(),
            });
        }
        Ok(parsed)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[instrument(skip(self))]
    async fn get(&self, url: &str) -> Result<Vec<u8>, TransportError> {
        let url = self.check_origin(url)?;

        let mut request = self
            .client
            .get(url.clone())
            .header(USER_AGENT, "gh-report")
            .header(ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28");
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        debug!(authenticated = self.token.is_some(), "sending GET request");
        let response = request.send().await?;
        let status = response.status();
        debug!(%status, "received response");

        if status != StatusCode::OK {
            return Err(TransportError::Status {
                url: url.to_string(),
                status,
            });
        }

        let body = response.bytes().await?;
        debug!(body_bytes = body.len(), "read response body");
        Ok(body.to_vec())
    }
}
