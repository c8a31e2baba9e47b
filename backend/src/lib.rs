//! # Birthday Tracker Backend
//!
//! Computes and schedules "upcoming birthdays" for a community site: the
//! engine resolves raw profile date values into canonical birth dates,
//! projects each onto its next occurrence, filters by social scope,
//! window and visibility, caches results, and drives a once-daily
//! idempotent notification pass across mail, activity-feed and in-app
//! channels.
//!
//! ## Architecture
//!
//! The crate is split into two layers:
//!
//! ```text
//! Rendering layer (widgets, admin pages — external callers)
//!     ↓
//! Domain Layer (query engine, date math, notification cycle)
//!     ↓
//! Storage Layer (collaborator traits + bundled implementations)
//! ```
//!
//! The hosting platform owns all member data; this crate only reads it
//! through the `storage` traits and writes nothing except cache entries
//! and the daily sent-tracking state.

pub mod domain;
pub mod storage;

pub use domain::{
    BirthdayCache, BirthdayService, NotificationService, SettingsService,
};
pub use storage::{
    ActivityBroadcaster, CacheStore, Mailer, MemberDirectory, ProfileStore, RelationshipStore,
    SentTrackingStore,
};
