//! GitHub as the issuing authority
//!
//! Bundles the transport, clock, retry policy and App JWT so every call
//! refreshes the JWT first and runs under the retry policy.

use std::sync::Arc;

use crate::error::Result;
use crate::github::api::{self, InstallationTokenResponse};
use crate::platform::{Clock, HttpClient};
use crate::retry::RetryPolicy;

use super::assertion::AssertionManager;
use super::coordinate::RepoCoordinate;

pub(crate) struct Authority {
    pub(crate) base_url: String,
    pub(crate) http: Arc<dyn HttpClient>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) assertion: AssertionManager,
    pub(crate) retry: RetryPolicy,
}

impl Authority {
    pub(crate) fn now_secs(&self) -> i64 {
        i64::try_from(self.clock.now_secs()).unwrap_or(i64::MAX)
    }

    async fn app_jwt(&self) -> Result<String> {
        self.assertion.current(self.now_secs()).await
    }

    pub(crate) async fn repo_installation(&self, coord: &RepoCoordinate) -> Result<Option<u64>> {
        let jwt = self.app_jwt().await?;
        api::get_repo_installation_id(
            &self.base_url,
            coord.owner(),
            coord.name(),
            &jwt,
            self.http.as_ref(),
            &self.retry,
        )
        .await
    }

    pub(crate) async fn installation_token(
        &self,
        installation_id: u64,
    ) -> Result<Option<InstallationTokenResponse>> {
        let jwt = self.app_jwt().await?;
        api::create_installation_token(
            &self.base_url,
            installation_id,
            &jwt,
            self.http.as_ref(),
            &self.retry,
        )
        .await
    }

    pub(crate) async fn installations(&self) -> Result<Vec<u64>> {
        let jwt = self.app_jwt().await?;
        api::list_installations(&self.base_url, &jwt, self.http.as_ref(), &self.retry).await
    }
}
