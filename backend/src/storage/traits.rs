//! # Storage Traits
//!
//! This module defines the collaborator abstractions the birthday engine
//! depends on. The engine never talks to a concrete member database, cache
//! backend or mail transport; it works against these traits so the hosting
//! platform can plug in whatever it already runs.

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use shared::{MemberProfile, RawBirthdayValue, VisibilityLevel};
use std::time::Duration;

/// Trait defining read access to member profile fields.
///
/// The birthday value is read fresh on every query; this engine never
/// writes profile data.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Fetch a field value through the primary profile-data accessor
    async fn field_value(
        &self,
        field_id: &str,
        user_id: &str,
    ) -> Result<Option<RawBirthdayValue>>;

    /// Fetch a field value through a direct secondary lookup
    ///
    /// Used only when the primary accessor yields nothing; some installs
    /// carry rows the primary accessor cannot see.
    async fn field_value_raw(
        &self,
        field_id: &str,
        user_id: &str,
    ) -> Result<Option<RawBirthdayValue>>;

    /// Get the visibility level a member configured for the field
    async fn field_visibility(&self, field_id: &str, user_id: &str) -> Result<VisibilityLevel>;

    /// Get the date format configured on the field itself, if any
    ///
    /// Returns a chrono strftime pattern such as "%d/%m/%Y".
    async fn field_date_format(&self, field_id: &str) -> Result<Option<String>>;
}

/// Trait defining access to the social graph.
#[async_trait]
pub trait RelationshipStore: Send + Sync {
    /// IDs of the user's accepted friends
    async fn friends_of(&self, user_id: &str) -> Result<Vec<String>>;

    /// IDs of the members the user follows
    async fn following_of(&self, user_id: &str) -> Result<Vec<String>>;

    /// Whether two users share an accepted mutual friendship
    async fn are_friends(&self, a: &str, b: &str) -> Result<bool>;
}

/// Trait defining access to the site's member directory.
#[async_trait]
pub trait MemberDirectory: Send + Sync {
    /// List member IDs, bounded by `limit` when given
    async fn list_member_ids(&self, limit: Option<usize>) -> Result<Vec<String>>;

    /// Fetch one member's directory row
    async fn get_member(&self, user_id: &str) -> Result<Option<MemberProfile>>;
}

/// Trait defining the in-process object cache the result cache writes to.
///
/// Modeled after a site-wide object cache: values are opaque strings, keys
/// live in one shared namespace, and `flush` clears that whole namespace.
/// Synchronous by design; implementations are expected to be memory-backed.
pub trait CacheStore: Send + Sync {
    /// Get a cached value, `None` on miss or expiry
    fn get(&self, key: &str) -> Option<String>;

    /// Store a value with a time-to-live
    fn set(&self, key: &str, value: String, ttl: Duration);

    /// Drop every entry in the namespace
    fn flush(&self);
}

/// Trait defining the outbound mail collaborator.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Send one message; failures are reported, never retried here
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<()>;
}

/// Trait defining the activity-feed and in-app notification collaborator.
#[async_trait]
pub trait ActivityBroadcaster: Send + Sync {
    /// Post a celebration entry on the member's activity feed
    async fn post_activity(&self, user_id: &str, message: &str) -> Result<()>;

    /// Deliver an in-app notification to one recipient about `item_id`
    async fn notify(&self, recipient_id: &str, item_id: &str, action: &str) -> Result<()>;
}

/// Trait defining the per-day sent-tracking store.
///
/// Guarantees at-most-once dispatch per user per calendar day: a user ID
/// appears in the tracking set at most once, and the set is cleared when
/// the scheduler detects a day rollover.
#[async_trait]
pub trait SentTrackingStore: Send + Sync {
    /// The calendar date the scheduler last completed a rollover check for
    async fn last_processed_date(&self) -> Result<Option<NaiveDate>>;

    /// Record the calendar date of the current cycle
    async fn set_last_processed_date(&self, date: NaiveDate) -> Result<()>;

    /// Whether the user was already dispatched to today
    async fn is_marked(&self, user_id: &str) -> Result<bool>;

    /// Mark the user as processed with a Unix timestamp
    async fn mark_sent(&self, user_id: &str, timestamp: i64) -> Result<()>;

    /// Clear the tracking set (day rollover)
    async fn clear(&self) -> Result<()>;
}
