//! # Domain Module
//!
//! Contains all business logic for the birthday tracker.
//!
//! This module encapsulates the rules that turn inconsistently stored
//! profile dates into ranked upcoming-birthday lists and a once-daily
//! notification pass. It operates independently of any specific platform
//! or storage mechanism.
//!
//! ## Module Organization
//!
//! - **date_parser**: Multi-format normalization of stored birthday values
//! - **calendar**: Next-occurrence projection, leap-day handling, age math
//! - **visibility**: Per-field visibility decisions against a viewer
//! - **birthday_service**: The query engine orchestrating the full pipeline
//! - **result_cache**: Keyed memoization with coarse event invalidation
//! - **notification_service**: The idempotent daily notification cycle
//! - **settings_service**: Notification settings loading
//!
//! ## Key Invariants
//!
//! - Emitted entries always carry an age of at least 1
//! - Today's birthdays sort before all others; the rest are soonest-first
//! - A member is dispatched to at most once per calendar day, no matter
//!   how often the scheduler ticks
//! - Per-member data problems skip that member, never the whole query

pub mod birthday_service;
pub mod calendar;
pub mod date_parser;
pub mod notification_service;
pub mod result_cache;
pub mod settings_service;
pub mod visibility;

pub use birthday_service::*;
pub use calendar::*;
pub use date_parser::*;
pub use notification_service::*;
pub use result_cache::*;
pub use settings_service::*;
