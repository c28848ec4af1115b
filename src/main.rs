mod cli;
mod config;
mod github;
mod pr;
mod report;

use clap::Parser;
use std::io::IsTerminal;
use std::process::ExitCode;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, info_span, warn, Instrument};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command};
use config::Config;
use github::{GitHub, GitHubError, HttpTransport};
use report::ReportError;

#[derive(Debug, Error)]
enum AppError {
    #[error("Error fetching user's PRs: {0}")]
    LatestPrs(#[source] GitHubError),

    #[error("Error fetching user repositories: {0}")]
    Repos(#[source] GitHubError),

    #[error("Error when checking pipeline: {0}")]
    Pipeline(#[source] GitHubError),

    #[error("Error fetching PR statuses: {0}")]
    PrStatus(#[source] GitHubError),

    #[error(transparent)]
    Report(#[from] ReportError),
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .from_env_lossy(),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = dotenvy::dotenv() {
        debug!(error = %e, "no .env file loaded, relying on environment variables");
    }

    let cli = Cli::parse_from(cli::normalize_args(std::env::args_os()));

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            println!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if config.token().is_none() {
        warn!("GITHUB_TOKEN is not set. Making unauthenticated requests.");
    }

    let command = match cli.into_command() {
        Ok(command) => command,
        Err(e) => {
            println!("Error: {}", e);
            return ExitCode::from(2);
        }
    };

    let github = match build_client(&config) {
        Ok(github) => github,
        Err(e) => {
            println!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match run(command, &github, &config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            println!("{}", e);
            ExitCode::FAILURE
        }
    }
}

/// Build the API client. Requests only ever go to https://api.github.com.
fn build_client(config: &Config) -> Result<GitHub, GitHubError> {
    let transport = HttpTransport::new(config.token().map(str::to_string));
    GitHub::new(Arc::new(transport))
}

async fn run(command: Command, github: &GitHub, config: &Config) -> Result<(), AppError> {
    match command {
        Command::UserLatestPrs { user, num_prs } => {
            let prs = github
                .latest_prs_by_user(&user, num_prs)
                .instrument(info_span!("user_latest_prs", user = %user, num_prs))
                .await
                .map_err(AppError::LatestPrs)?;
            report::write_latest_prs(&mut std::io::stdout().lock(), &prs)?;
        }
        Command::UserInfoRepos { user } => {
            let repos = github
                .user_repos(&user)
                .instrument(info_span!("user_info_repos", user = %user))
                .await
                .map_err(AppError::Repos)?;
            report::write_repos(&mut std::io::stdout().lock(), &user, &repos)?;
        }
        Command::PipelineStatus { repo } => {
            let total_count = github
                .workflow_count(&repo)
                .instrument(info_span!("pipeline_status", repo = %repo))
                .await
                .map_err(AppError::Pipeline)?;
            report::write_pipeline(&mut std::io::stdout().lock(), &repo, total_count)?;
        }
        Command::PrStatus { repo } => {
            let prs = pr::resolve_statuses(github, &repo, config.concurrency())
                .await
                .map_err(AppError::PrStatus)?;
            info!(prs = prs.len(), "resolved PR statuses");

            let stdout = std::io::stdout();
            let color = stdout.is_terminal();
            report::write_pr_statuses(&mut stdout.lock(), &repo, &prs, color)?;
        }
    }

    Ok(())
}
