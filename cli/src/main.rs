//! app-token: print a GitHub App installation token for a repository
//!
//! Configuration comes from the environment (`GITHUB_APP_ID`,
//! `GITHUB_APP_PRIVATE_KEY` or `GITHUB_APP_PRIVATE_KEY_PATH`,
//! `GITHUB_API_URL`); the matching flags override it.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use app_token_core::config::Config;
use app_token_core::platform::Clock;
use app_token_core::TokenContext;

mod platform;

use platform::{ProcessEnv, ReqwestHttpClient, SystemClock};

/// Exit status when the App has no installations at all
const EXIT_NO_INSTALLATIONS: u8 = 2;

#[derive(Parser)]
#[command(name = "app-token", version, about = "Print a GitHub App installation token for a repository")]
struct Cli {
    /// Repository as OWNER/NAME, or a github.com / api.github.com URL
    repo: String,

    /// GitHub App id (overrides GITHUB_APP_ID)
    #[arg(long)]
    app_id: Option<u64>,

    /// Path to the App private key PEM (overrides GITHUB_APP_PRIVATE_KEY_PATH)
    #[arg(long)]
    private_key_path: Option<String>,

    /// GitHub API base URL (overrides GITHUB_API_URL)
    #[arg(long)]
    api_url: Option<String>,

    /// Print {"token", "expires_in"} as JSON instead of the bare token
    #[arg(long)]
    json: bool,

    /// Log level when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(Serialize)]
struct TokenOutput<'a> {
    token: &'a str,
    expires_in: u64,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_filter = format!("app_token={0},app_token_core={0}", cli.log_level);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Process environment with the command-line overrides applied
///
/// `--private-key-path` also hides an inline `GITHUB_APP_PRIVATE_KEY`, which
/// would otherwise win over any key file.
fn cli_env(cli: &Cli) -> ProcessEnv {
    let mut env = ProcessEnv::new();
    if let Some(app_id) = cli.app_id {
        env.set("GITHUB_APP_ID", app_id.to_string());
    }
    if let Some(path) = &cli.private_key_path {
        env.set("GITHUB_APP_PRIVATE_KEY_PATH", path.as_str());
        env.mask("GITHUB_APP_PRIVATE_KEY");
    }
    if let Some(url) = &cli.api_url {
        env.set("GITHUB_API_URL", url.as_str());
    }
    env
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let env = cli_env(&cli);
    let config = Config::from_env(&env).context("failed to load configuration")?;
    let clock = Arc::new(SystemClock);
    let ctx = TokenContext::from_config(&config, Arc::new(ReqwestHttpClient::new()), clock.clone())
        .context("failed to initialise GitHub App credentials")?;

    let credential = if cli.repo.contains("://") {
        ctx.credential_for_url(&cli.repo).await
    } else {
        let (owner, name) = cli
            .repo
            .split_once('/')
            .context("repository must be OWNER/NAME or a URL")?;
        ctx.credential_for_repo(owner, name).await
    }
    .with_context(|| format!("failed to get a token for '{}'", cli.repo))?;

    let Some(credential) = credential else {
        tracing::warn!(app_id = config.github_app_id, "GitHub App is not installed anywhere");
        return Ok(ExitCode::from(EXIT_NO_INSTALLATIONS));
    };

    if cli.json {
        let now = i64::try_from(clock.now_secs()).unwrap_or(i64::MAX);
        let output = TokenOutput {
            token: &credential.token,
            expires_in: credential.expires_in(now),
        };
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("{}", credential.token);
    }

    Ok(ExitCode::SUCCESS)
}
