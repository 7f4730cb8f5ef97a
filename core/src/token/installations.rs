//! Repository -> installation id resolution

use moka::policy::EvictionPolicy;
use moka::sync::Cache;
use tracing::debug;

use crate::error::Result;

use super::authority::Authority;
use super::coordinate::RepoCoordinate;

/// Caches which installation covers each repository.
///
/// Only positive answers are cached: a repository the App is not installed on
/// must be asked about again once someone installs it.
pub struct InstallationResolver {
    ids: Cache<String, u64>,
}

impl InstallationResolver {
    pub fn new(max_capacity: u64) -> Self {
        Self {
            ids: Cache::builder()
                .max_capacity(max_capacity)
                .eviction_policy(EvictionPolicy::lru())
                .build(),
        }
    }

    pub(crate) async fn resolve(
        &self,
        authority: &Authority,
        coord: &RepoCoordinate,
    ) -> Result<Option<u64>> {
        let key = coord.key();
        if let Some(id) = self.ids.get(&key) {
            return Ok(Some(id));
        }

        let id = authority.repo_installation(coord).await?;
        if let Some(id) = id {
            debug!(repo = %coord, installation_id = id, "resolved installation");
            self.ids.insert(key, id);
        }
        Ok(id)
    }

    /// Any cached installation id
    pub fn any_cached(&self) -> Option<u64> {
        self.ids.iter().next().map(|(_, id)| id)
    }

    /// Drop every repository mapped to an installation that no longer exists
    pub fn forget_installation(&self, installation_id: u64) {
        let stale: Vec<_> = self
            .ids
            .iter()
            .filter(|(_, id)| *id == installation_id)
            .map(|(key, _)| key)
            .collect();
        for key in stale {
            self.ids.invalidate(key.as_str());
        }
    }
}
