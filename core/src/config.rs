//! Configuration and secrets management

use std::path::PathBuf;

use crate::error::{ApiError, Result};
use crate::platform::Environment;

/// Default GitHub REST API base URL
pub const GITHUB_API_BASE: &str = "https://api.github.com";

/// User agent sent on every GitHub API call
pub const USER_AGENT: &str = "app-token";

/// GitHub REST API version header value
pub const GITHUB_API_VERSION: &str = "2022-11-28";

/// Validity window of the App JWT, in minutes (GitHub allows at most 10)
pub const APP_JWT_VALIDITY_MINS: u32 = 5;

/// Refresh JWTs and installation tokens once less than this many seconds remain.
/// The same amount is used to backdate the JWT `iat` for clock drift.
pub const REFRESH_BUFFER_SECS: i64 = 60;

/// Capacity of the coordinate -> installation id cache
pub const INSTALLATION_CACHE_CAPACITY: u64 = 10_000;

/// Capacity of the installation id -> credential cache
pub const CREDENTIAL_CACHE_CAPACITY: u64 = 64;

/// Capacity of the coordinate -> applicability cache
pub const APPLICABILITY_CACHE_CAPACITY: u64 = 10_000;

/// Maximum attempts per GitHub API call (initial attempt included)
pub const RETRY_MAX_ATTEMPTS: u32 = 5;

/// Base delay of the exponential retry backoff, in milliseconds
pub const RETRY_BASE_DELAY_MS: u64 = 500;

/// Upper bound of a single retry delay, in milliseconds
pub const RETRY_MAX_DELAY_MS: u64 = 8_000;

/// Where the App private key comes from
#[derive(Debug, Clone)]
pub enum PrivateKeySource {
    /// PEM text held in memory
    Pem(String),
    /// Path to a PEM file
    File(PathBuf),
}

impl PrivateKeySource {
    /// Load the PEM text, reading the file if needed
    pub fn load(&self) -> Result<String> {
        match self {
            Self::Pem(pem) => Ok(pem.clone()),
            Self::File(path) => std::fs::read_to_string(path).map_err(|e| {
                ApiError::invalid_key(format!("cannot read '{}': {}", path.display(), e))
            }),
        }
    }
}

/// Application configuration loaded from environment
#[derive(Debug, Clone)]
pub struct Config {
    /// GitHub App numeric ID
    pub github_app_id: u64,
    /// GitHub App private key
    pub private_key: PrivateKeySource,
    /// GitHub API base URL (GitHub Enterprise uses `https://host/api/v3`)
    pub api_base_url: String,
}

impl Config {
    /// Load configuration from platform environment
    pub fn from_env(env: &dyn Environment) -> Result<Self> {
        let raw_app_id = env
            .get_secret("GITHUB_APP_ID")
            .map_err(|_| ApiError::internal("GITHUB_APP_ID secret not set"))?;
        let github_app_id = parse_app_id(&raw_app_id)?;

        let private_key = match env.get_secret("GITHUB_APP_PRIVATE_KEY") {
            Ok(pem) => PrivateKeySource::Pem(pem),
            Err(_) => env
                .get_var("GITHUB_APP_PRIVATE_KEY_PATH")
                .map(|path| PrivateKeySource::File(PathBuf::from(path)))
                .map_err(|_| {
                    ApiError::internal(
                        "neither GITHUB_APP_PRIVATE_KEY nor GITHUB_APP_PRIVATE_KEY_PATH is set",
                    )
                })?,
        };

        let api_base_url = env
            .get_var("GITHUB_API_URL")
            .unwrap_or_else(|_| GITHUB_API_BASE.to_string());

        Ok(Self {
            github_app_id,
            private_key,
            api_base_url,
        })
    }
}

/// Parse a GitHub App id, which must be a positive integer
pub fn parse_app_id(raw: &str) -> Result<u64> {
    match raw.trim().parse::<u64>() {
        Ok(0) | Err(_) => Err(ApiError::invalid_request(format!(
            "GitHub App id must be a positive integer, got '{}'",
            raw
        ))),
        Ok(id) => Ok(id),
    }
}
