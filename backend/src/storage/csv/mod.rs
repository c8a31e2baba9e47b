//! # CSV Storage
//!
//! File-backed persistence for the scheduler's sent-tracking state, so the
//! at-most-once guarantee survives process restarts between cron ticks.

pub mod tracking_repository;

pub use tracking_repository::CsvTrackingRepository;
