//! Installation id -> installation access token

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use moka::policy::EvictionPolicy;
use moka::sync::Cache;
use tracing::{debug, info};

use crate::config::REFRESH_BUFFER_SECS;
use crate::error::{ApiError, Result};

use super::authority::Authority;

/// An installation access token and its absolute expiry
///
/// Never mutated; a refresh replaces the cached `Arc` wholesale.
#[derive(Clone, PartialEq, Eq)]
pub struct InstallationCredential {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl InstallationCredential {
    /// Build from the `expires_at` string GitHub returns (ISO 8601)
    pub fn parse(token: String, expires_at: &str) -> Result<Self> {
        let expires_at: DateTime<Utc> = expires_at.parse().map_err(|e| {
            ApiError::upstream_error(format!("invalid expires_at '{}': {}", expires_at, e))
        })?;
        Ok(Self { token, expires_at })
    }

    /// Whether at least the refresh buffer of life remains at `now_secs`
    pub fn is_fresh(&self, now_secs: i64) -> bool {
        self.expires_at.timestamp() - now_secs >= REFRESH_BUFFER_SECS
    }

    /// Seconds until expiry, zero once expired
    pub fn expires_in(&self, now_secs: i64) -> u64 {
        u64::try_from(self.expires_at.timestamp() - now_secs).unwrap_or(0)
    }
}

impl fmt::Debug for InstallationCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InstallationCredential")
            .field("token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Caches one credential per installation and re-mints it lazily
pub struct CredentialManager {
    credentials: Cache<u64, Arc<InstallationCredential>>,
}

impl CredentialManager {
    pub fn new(max_capacity: u64) -> Self {
        Self {
            credentials: Cache::builder()
                .max_capacity(max_capacity)
                .eviction_policy(EvictionPolicy::lru())
                .build(),
        }
    }

    /// Credential for `installation_id`, minting a new one when the cached
    /// credential is missing or inside the refresh buffer.
    ///
    /// Returns `None` when GitHub reports the installation gone. Two callers
    /// racing on a stale entry may both mint; the later insert wins.
    pub(crate) async fn credential_for(
        &self,
        authority: &Authority,
        installation_id: u64,
    ) -> Result<Option<Arc<InstallationCredential>>> {
        if let Some(cached) = self.credentials.get(&installation_id) {
            if cached.is_fresh(authority.now_secs()) {
                debug!(installation_id, "using cached installation token");
                return Ok(Some(cached));
            }
        }

        let Some(response) = authority.installation_token(installation_id).await? else {
            self.credentials.invalidate(&installation_id);
            return Ok(None);
        };

        let credential = Arc::new(InstallationCredential::parse(
            response.token,
            &response.expires_at,
        )?);
        info!(
            installation_id,
            expires_at = %credential.expires_at,
            "minted installation token"
        );
        self.credentials.insert(installation_id, credential.clone());
        Ok(Some(credential))
    }

    /// Any cached credential that is still fresh at `now_secs`
    pub fn any_fresh(&self, now_secs: i64) -> Option<Arc<InstallationCredential>> {
        self.credentials
            .iter()
            .map(|(_, credential)| credential)
            .find(|credential| credential.is_fresh(now_secs))
    }
}
