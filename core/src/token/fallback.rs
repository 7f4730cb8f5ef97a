//! Some usable installation token when the repository has none of its own

use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::{ApiError, Result};

use super::credentials::InstallationCredential;
use super::TokenContext;

impl TokenContext {
    /// Any installation credential the App can get, cheapest source first:
    /// a cached fresh credential, then a cached installation id, then the
    /// first listed installation that still mints a token.
    ///
    /// `Ok(None)` means the App is not installed anywhere.
    pub(crate) async fn any_credential(&self) -> Result<Option<Arc<InstallationCredential>>> {
        if let Some(credential) = self.credentials.any_fresh(self.authority.now_secs()) {
            debug!("falling back to a cached installation token");
            return Ok(Some(credential));
        }

        if let Some(installation_id) = self.installations.any_cached() {
            debug!(installation_id, "falling back to a cached installation");
            match self
                .credentials
                .credential_for(&self.authority, installation_id)
                .await?
            {
                Some(credential) => return Ok(Some(credential)),
                None => self.installations.forget_installation(installation_id),
            }
        }

        let installations = self.authority.installations().await?;
        if installations.is_empty() {
            warn!(app_id = self.app_id, "GitHub App has no installations");
            return Ok(None);
        }

        for &installation_id in &installations {
            debug!(installation_id, "falling back to a listed installation");
            if let Some(credential) = self
                .credentials
                .credential_for(&self.authority, installation_id)
                .await?
            {
                return Ok(Some(credential));
            }
            debug!(installation_id, "listed installation returned no access token");
        }

        Err(ApiError::upstream_error(format!(
            "none of the {} listed installations returned an access token",
            installations.len()
        )))
    }
}
