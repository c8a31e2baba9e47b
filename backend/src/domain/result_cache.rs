//! Result caching for birthday queries.
//!
//! Computing an upcoming-birthdays list touches the member directory, the
//! profile store and the social graph for every candidate, so results are
//! memoized for a fixed window. Invalidation is deliberately coarse: any
//! event that could change any result flushes the whole namespace rather
//! than chasing individual keys.

use log::{debug, warn};
use shared::{BirthdayQuery, BirthdayScope, UpcomingBirthday, ViewerContext};
use std::hash::Hasher;
use std::sync::Arc;
use std::time::Duration;
use twox_hash::XxHash64;

use crate::storage::traits::CacheStore;

/// How long a computed result stays served from cache.
///
/// A cached list may misreport `is_today` for up to this long around
/// midnight; that staleness is an accepted trade, not a bug.
pub const RESULT_TTL: Duration = Duration::from_secs(30 * 60);

const KEY_PREFIX: &str = "birthdays";

/// Memoizes query results in an in-process cache store.
#[derive(Clone)]
pub struct BirthdayCache {
    store: Arc<dyn CacheStore>,
}

impl BirthdayCache {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store }
    }

    /// Build the cache key for a query.
    ///
    /// The key hashes the deterministically serialized query; viewer-scoped
    /// lookups (friends/followers) append the viewer id so two viewers never
    /// share an entry.
    pub fn cache_key(query: &BirthdayQuery, viewer: &ViewerContext) -> String {
        let serialized = serde_json::to_string(query).unwrap_or_default();
        let mut hasher = XxHash64::with_seed(0);
        hasher.write(serialized.as_bytes());

        let mut key = format!("{}:{:016x}", KEY_PREFIX, hasher.finish());

        if matches!(
            query.scope,
            BirthdayScope::Friends | BirthdayScope::Followers
        ) {
            if let Some(viewer_id) = &viewer.viewer_id {
                key.push_str(":user:");
                key.push_str(viewer_id);
            }
        }

        key
    }

    /// Fetch a cached result; corrupt entries count as misses.
    pub fn get(&self, query: &BirthdayQuery, viewer: &ViewerContext) -> Option<Vec<UpcomingBirthday>> {
        let key = Self::cache_key(query, viewer);
        let encoded = self.store.get(&key)?;
        match serde_json::from_str(&encoded) {
            Ok(value) => {
                debug!("Birthday cache hit for {}", key);
                Some(value)
            }
            Err(e) => {
                warn!("Discarding unreadable cache entry {}: {}", key, e);
                None
            }
        }
    }

    /// Store a computed result under the query's key.
    pub fn store(&self, query: &BirthdayQuery, viewer: &ViewerContext, value: &[UpcomingBirthday]) {
        match serde_json::to_string(value) {
            Ok(encoded) => {
                let key = Self::cache_key(query, viewer);
                self.store.set(&key, encoded, RESULT_TTL);
            }
            Err(e) => warn!("Failed to encode birthday result for caching: {}", e),
        }
    }

    /// Drop every cached result.
    pub fn flush(&self) {
        self.store.flush();
    }

    /// A member's birthday field changed.
    pub fn on_profile_field_updated(&self, user_id: &str) {
        debug!("Flushing birthday cache: profile field updated for {}", user_id);
        self.flush();
    }

    /// A friendship was accepted, deleted or withdrawn.
    pub fn on_friendship_changed(&self, a: &str, b: &str) {
        debug!("Flushing birthday cache: friendship changed between {} and {}", a, b);
        self.flush();
    }

    /// A follow was created or removed.
    pub fn on_follow_changed(&self, follower: &str, followed: &str) {
        debug!(
            "Flushing birthday cache: follow changed {} -> {}",
            follower, followed
        );
        self.flush();
    }

    /// A member registered.
    pub fn on_member_registered(&self, user_id: &str) {
        debug!("Flushing birthday cache: member {} registered", user_id);
        self.flush();
    }

    /// A member was deleted.
    pub fn on_member_deleted(&self, user_id: &str) {
        debug!("Flushing birthday cache: member {} deleted", user_id);
        self.flush();
    }

    /// Daily safety-net flush, independent of the event triggers.
    pub fn daily_flush(&self) {
        debug!("Daily birthday cache flush");
        self.flush();
    }
}
