//! # In-Memory Storage
//!
//! Memory-backed implementations of the collaborator traits. These serve
//! two purposes: the cache store is the production default (it is an
//! in-process object cache by contract), and the remaining stores back the
//! unit and integration tests without a real platform underneath.

pub mod cache;
pub mod channels;
pub mod members;
pub mod profile;
pub mod relationships;
pub mod tracking;

pub use cache::InMemoryCacheStore;
pub use channels::{RecordingBroadcaster, RecordingMailer, SentMail};
pub use members::InMemoryMemberDirectory;
pub use profile::InMemoryProfileStore;
pub use relationships::InMemoryRelationshipStore;
pub use tracking::InMemoryTrackingStore;
