use serde::Deserialize;
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::pr::DEFAULT_CONCURRENCY;

/// Optional configuration file looked up in the current directory.
pub const CONFIG_FILE: &str = ".gh-report.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level configuration loaded from .gh-report.toml.
///
/// Every field is optional; the tool works with zero config.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub github: GitHubConfig,

    #[serde(default)]
    pub status: StatusConfig,
}

/// The API endpoint is always https://api.github.com and cannot be
/// configured, so the token is never sent anywhere else.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GitHubConfig {
    /// GitHub API token. If None, falls back to GITHUB_TOKEN env var.
    pub token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StatusConfig {
    /// Commit status lookups allowed in flight at once.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
        }
    }
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

impl Config {
    /// Load configuration from .gh-report.toml in the current directory,
    /// or defaults if it doesn't exist, then resolve the token from
    /// GITHUB_TOKEN when the file doesn't set one.
    ///
    /// A `.env` file should already have been loaded into the environment.
    pub fn load() -> Result<Config, ConfigError> {
        let path = Path::new(CONFIG_FILE);
        let config = if path.exists() {
            Self::load_from(path)?
        } else {
            Config::default()
        };

        Ok(config.with_env_token(std::env::var("GITHUB_TOKEN").ok()))
    }

    /// Load from a specific path.
    pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Fill the token from `env_token` unless the file already set a
    /// non-empty one. Blank tokens end up as None.
    pub fn with_env_token(mut self, env_token: Option<String>) -> Self {
        let token = self
            .github
            .token
            .take()
            .filter(|t| !t.trim().is_empty())
            .or(env_token)
            .filter(|t| !t.trim().is_empty());
        self.github.token = token;
        self
    }

    pub fn token(&self) -> Option<&str> {
        self.github.token.as_deref()
    }

    pub fn concurrency(&self) -> usize {
        self.status.concurrency.max(1)
    }
}
