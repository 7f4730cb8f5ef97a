//! Installation token engine
//!
//! [`TokenContext`] turns a repository coordinate into an installation access
//! token: it resolves which installation covers the repository, mints (or
//! reuses) that installation's token, and falls back to any installation of
//! the App when the repository has none. All state lives in bounded in-memory
//! caches owned by the context; nothing refreshes in the background.

mod applicability;
mod assertion;
mod authority;
mod coordinate;
mod credentials;
mod fallback;
mod installations;

pub use applicability::Applicability;
pub use coordinate::RepoCoordinate;
pub use credentials::{CredentialManager, InstallationCredential};
pub use installations::InstallationResolver;

use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::{
    Config, PrivateKeySource, APPLICABILITY_CACHE_CAPACITY, APP_JWT_VALIDITY_MINS,
    CREDENTIAL_CACHE_CAPACITY, GITHUB_API_BASE, INSTALLATION_CACHE_CAPACITY,
};
use crate::error::{ApiError, Result};
use crate::github::auth::PemJwtSigner;
use crate::platform::{Clock, HttpClient, JwtSigner};
use crate::retry::RetryPolicy;

use assertion::AssertionManager;
use authority::Authority;

/// Long-lived token source for one GitHub App
///
/// Share it behind an `Arc`; every method takes `&self` and the caches are
/// safe for concurrent use.
pub struct TokenContext {
    app_id: u64,
    authority: Authority,
    installations: InstallationResolver,
    credentials: CredentialManager,
    applicability: Applicability,
}

impl TokenContext {
    /// Create a context signing with the App's RSA private key.
    ///
    /// Fails when `app_id` is zero or the key cannot be read or parsed.
    pub fn new(
        app_id: u64,
        private_key: &PrivateKeySource,
        base_url: Option<&str>,
        http: Arc<dyn HttpClient>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        if app_id == 0 {
            return Err(ApiError::invalid_request("GitHub App id must be positive"));
        }
        let signer = PemJwtSigner::new(app_id, &private_key.load()?)?;

        let mut builder = Self::builder(app_id, Box::new(signer));
        if let Some(base_url) = base_url {
            builder = builder.base_url(base_url);
        }
        Ok(builder.build(http, clock))
    }

    /// Create a context from loaded configuration
    pub fn from_config(
        config: &Config,
        http: Arc<dyn HttpClient>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        Self::new(
            config.github_app_id,
            &config.private_key,
            Some(&config.api_base_url),
            http,
            clock,
        )
    }

    /// Builder for a context with a custom signer, retry policy or cache sizes
    pub fn builder(app_id: u64, signer: Box<dyn JwtSigner>) -> TokenContextBuilder {
        TokenContextBuilder {
            app_id,
            signer,
            base_url: GITHUB_API_BASE.to_string(),
            retry: RetryPolicy::default(),
            jwt_validity_mins: APP_JWT_VALIDITY_MINS,
            installation_capacity: INSTALLATION_CACHE_CAPACITY,
            credential_capacity: CREDENTIAL_CACHE_CAPACITY,
            applicability_capacity: APPLICABILITY_CACHE_CAPACITY,
        }
    }

    pub fn app_id(&self) -> u64 {
        self.app_id
    }

    /// Issue time of the App JWT currently in use
    pub fn assertion_issued_at(&self) -> Option<i64> {
        self.authority.assertion.issued_at()
    }

    /// Installation token usable on `owner/name`.
    ///
    /// `Ok(None)` only when the App has no installations at all.
    pub async fn token_for_repo(&self, owner: &str, name: &str) -> Result<Option<String>> {
        let credential = self.credential_for_repo(owner, name).await?;
        Ok(credential.map(|c| c.token.clone()))
    }

    /// Installation token for the repository a GitHub URL points at
    pub async fn token_for_url(&self, url: &str) -> Result<Option<String>> {
        let credential = self.credential_for_url(url).await?;
        Ok(credential.map(|c| c.token.clone()))
    }

    /// Like [`token_for_url`](Self::token_for_url), keeping the expiry
    pub async fn credential_for_url(&self, url: &str) -> Result<Option<Arc<InstallationCredential>>> {
        let coord = RepoCoordinate::from_url(url)?;
        self.credential_for(&coord).await
    }

    /// Like [`token_for_repo`](Self::token_for_repo), keeping the expiry
    pub async fn credential_for_repo(
        &self,
        owner: &str,
        name: &str,
    ) -> Result<Option<Arc<InstallationCredential>>> {
        let coord = RepoCoordinate::new(owner, name)?;
        self.credential_for(&coord).await
    }

    async fn credential_for(
        &self,
        coord: &RepoCoordinate,
    ) -> Result<Option<Arc<InstallationCredential>>> {
        if !self.applicability.is_applicable(coord) {
            debug!(repo = %coord, "App not installed on repository, using fallback");
            return self.any_credential().await;
        }

        let Some(installation_id) = self.installations.resolve(&self.authority, coord).await?
        else {
            warn!(repo = %coord, "App not installed on repository, using fallback");
            self.applicability.mark_not_applicable(coord);
            return self.any_credential().await;
        };

        match self
            .credentials
            .credential_for(&self.authority, installation_id)
            .await?
        {
            Some(credential) => Ok(Some(credential)),
            None => Err(ApiError::upstream_error(format!(
                "installation {} for '{}' returned no access token",
                installation_id, coord
            ))),
        }
    }
}

/// Builder returned by [`TokenContext::builder`]
pub struct TokenContextBuilder {
    app_id: u64,
    signer: Box<dyn JwtSigner>,
    base_url: String,
    retry: RetryPolicy,
    jwt_validity_mins: u32,
    installation_capacity: u64,
    credential_capacity: u64,
    applicability_capacity: u64,
}

impl TokenContextBuilder {
    /// GitHub API base URL, e.g. `https://ghe.example.com/api/v3`
    pub fn base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Validity window of each signed App JWT (GitHub allows at most 10 minutes)
    pub fn jwt_validity(mut self, mins: u32) -> Self {
        self.jwt_validity_mins = mins;
        self
    }

    pub fn retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Capacities of the installation id, credential and applicability caches
    pub fn cache_capacities(mut self, installations: u64, credentials: u64, applicability: u64) -> Self {
        self.installation_capacity = installations;
        self.credential_capacity = credentials;
        self.applicability_capacity = applicability;
        self
    }

    pub fn build(self, http: Arc<dyn HttpClient>, clock: Arc<dyn Clock>) -> TokenContext {
        TokenContext {
            app_id: self.app_id,
            authority: Authority {
                base_url: self.base_url,
                http,
                clock,
                assertion: AssertionManager::new(self.signer, self.jwt_validity_mins),
                retry: self.retry,
            },
            installations: InstallationResolver::new(self.installation_capacity),
            credentials: CredentialManager::new(self.credential_capacity),
            applicability: Applicability::new(self.applicability_capacity),
        }
    }
}
