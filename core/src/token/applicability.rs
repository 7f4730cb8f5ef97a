//! Coordinates the App is known not to be installed on

use moka::policy::EvictionPolicy;
use moka::sync::Cache;

use super::coordinate::RepoCoordinate;

/// Remembers coordinates whose installation lookup returned 404.
///
/// A coordinate marked not applicable stays so for the life of the process;
/// eviction only costs one more lookup.
pub struct Applicability {
    flags: Cache<String, bool>,
}

impl Applicability {
    pub fn new(max_capacity: u64) -> Self {
        Self {
            flags: Cache::builder()
                .max_capacity(max_capacity)
                .eviction_policy(EvictionPolicy::lru())
                .build(),
        }
    }

    pub fn is_applicable(&self, coord: &RepoCoordinate) -> bool {
        self.flags.get(&coord.key()).unwrap_or(true)
    }

    pub fn mark_not_applicable(&self, coord: &RepoCoordinate) {
        self.flags.insert(coord.key(), false);
    }
}
