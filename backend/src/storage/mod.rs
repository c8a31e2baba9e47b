//! # Storage Module
//!
//! Collaborator abstractions and their bundled implementations.
//!
//! The engine's data lives elsewhere — member profiles, the social graph
//! and the member directory belong to the hosting platform. This module
//! defines the traits the domain layer works against, an in-memory
//! implementation of each (the cache store doubles as the production
//! default), and a CSV-backed sent-tracking repository for state that must
//! outlive a single process.

pub mod csv;
pub mod memory;
pub mod traits;

pub use csv::CsvTrackingRepository;
pub use memory::{
    InMemoryCacheStore, InMemoryMemberDirectory, InMemoryProfileStore,
    InMemoryRelationshipStore, InMemoryTrackingStore, RecordingBroadcaster, RecordingMailer,
    SentMail,
};
pub use traits::{
    ActivityBroadcaster, CacheStore, Mailer, MemberDirectory, ProfileStore, RelationshipStore,
    SentTrackingStore,
};
