//! Upcoming-birthday query engine.
//!
//! Orchestrates the whole computation: candidate selection by social scope,
//! per-member value lookup with fallback, normalization, next-occurrence
//! projection, window and visibility filtering, and the today-first
//! ordering contract. Per-member data problems are never errors — the
//! member is skipped and the rest of the result stands.

use anyhow::Result;
use chrono::{Datelike, Duration, NaiveDate};
use log::{debug, info, warn};
use std::cmp::Ordering;
use std::sync::Arc;

use crate::domain::calendar;
use crate::domain::date_parser::{self, DEFAULT_DATE_FORMAT};
use crate::domain::result_cache::BirthdayCache;
use crate::domain::visibility;
use crate::storage::traits::{CacheStore, MemberDirectory, ProfileStore, RelationshipStore};
use shared::{BirthdayQuery, BirthdayScope, RawBirthdayValue, UpcomingBirthday, ViewerContext};

/// Upper bound on candidates for all-members queries, so one widget render
/// cannot walk an arbitrarily large member base.
pub const ALL_MEMBERS_CAP: usize = 200;

/// Service computing upcoming-birthday lists.
#[derive(Clone)]
pub struct BirthdayService {
    profiles: Arc<dyn ProfileStore>,
    relationships: Arc<dyn RelationshipStore>,
    members: Arc<dyn MemberDirectory>,
    cache: BirthdayCache,
}

impl BirthdayService {
    /// Create a new BirthdayService over the platform collaborators.
    pub fn new(
        profiles: Arc<dyn ProfileStore>,
        relationships: Arc<dyn RelationshipStore>,
        members: Arc<dyn MemberDirectory>,
        cache_store: Arc<dyn CacheStore>,
    ) -> Self {
        Self {
            profiles,
            relationships,
            members,
            cache: BirthdayCache::new(cache_store),
        }
    }

    /// The result cache, exposed so hosting code can wire invalidation
    /// triggers (profile writes, friendship events, registrations).
    pub fn cache(&self) -> &BirthdayCache {
        &self.cache
    }

    /// Compute the upcoming-birthday list for a query, served from cache
    /// when a fresh entry exists.
    pub async fn upcoming_birthdays(
        &self,
        query: &BirthdayQuery,
        viewer: &ViewerContext,
        today: NaiveDate,
    ) -> Result<Vec<UpcomingBirthday>> {
        // Friends/followers scopes are meaningless without a viewer.
        if matches!(
            query.scope,
            BirthdayScope::Friends | BirthdayScope::Followers
        ) && viewer.viewer_id.is_none()
        {
            info!("Skipping {:?}-scoped birthday query without a viewer", query.scope);
            return Ok(Vec::new());
        }

        if let Some(cached) = self.cache.get(query, viewer) {
            return Ok(cached);
        }

        let computed = self.compute_upcoming(query, viewer, today).await?;
        self.cache.store(query, viewer, &computed);
        Ok(computed)
    }

    /// The uncached computation behind [`Self::upcoming_birthdays`].
    pub async fn compute_upcoming(
        &self,
        query: &BirthdayQuery,
        viewer: &ViewerContext,
        today: NaiveDate,
    ) -> Result<Vec<UpcomingBirthday>> {
        if query.field_id.is_empty() {
            info!("No birthday field configured; returning empty result");
            return Ok(Vec::new());
        }

        let candidates = self.resolve_candidates(query.scope, viewer).await;
        let window_end = today + Duration::days(query.range.days());
        let format = self.configured_format(&query.field_id).await;

        let mut results = Vec::new();

        for user_id in candidates {
            if Some(&user_id) == viewer.viewer_id.as_ref() {
                continue;
            }

            let Some(raw) = self.fetch_birthday_value(&query.field_id, &user_id).await else {
                continue;
            };

            let level = match self.profiles.field_visibility(&query.field_id, &user_id).await {
                Ok(level) => level,
                Err(e) => {
                    debug!("Visibility lookup failed for {}: {}; skipping", user_id, e);
                    continue;
                }
            };
            if !visibility::is_visible(&level, viewer, &user_id, self.relationships.as_ref()).await
            {
                continue;
            }

            let birth_date = match date_parser::normalize(&raw, &format, today.year()) {
                Ok(date) => date,
                Err(e) => {
                    debug!("Skipping {}: {}", user_id, e);
                    continue;
                }
            };

            let next_occurrence = calendar::next_occurrence(birth_date, today);
            // next_occurrence is never before today, so only the window's
            // inclusive upper bound needs checking.
            if next_occurrence > window_end {
                continue;
            }

            let age_turning = calendar::age_turning(birth_date, next_occurrence);
            if age_turning <= 0 {
                continue;
            }

            results.push(UpcomingBirthday {
                user_id,
                birth_date,
                next_occurrence,
                age_turning,
                is_today: calendar::is_birthday_today(birth_date, today),
            });
        }

        sort_today_first(&mut results);

        debug!(
            "Computed {} upcoming birthdays for {:?} scope",
            results.len(),
            query.scope
        );
        Ok(results)
    }

    /// Site-wide "whose birthday is today" pass for the daily scheduler.
    ///
    /// Runs with no viewer and no visibility filtering: this is a global
    /// batch context, not a member looking at a widget. Age here is the age
    /// turning today.
    pub async fn todays_birthdays(
        &self,
        field_id: &str,
        today: NaiveDate,
    ) -> Result<Vec<UpcomingBirthday>> {
        if field_id.is_empty() {
            info!("No birthday field configured; daily pass finds nothing");
            return Ok(Vec::new());
        }

        let members = match self.members.list_member_ids(None).await {
            Ok(ids) => ids,
            Err(e) => {
                warn!("Member directory unavailable for daily pass: {}", e);
                return Ok(Vec::new());
            }
        };
        let format = self.configured_format(field_id).await;

        let mut results = Vec::new();

        for user_id in members {
            let Some(raw) = self.fetch_birthday_value(field_id, &user_id).await else {
                continue;
            };

            let birth_date = match date_parser::normalize(&raw, &format, today.year()) {
                Ok(date) => date,
                Err(e) => {
                    debug!("Skipping {}: {}", user_id, e);
                    continue;
                }
            };

            if !calendar::is_birthday_today(birth_date, today) {
                continue;
            }

            let age_turning = today.year() - birth_date.year();
            if age_turning <= 0 {
                continue;
            }

            results.push(UpcomingBirthday {
                user_id,
                birth_date,
                next_occurrence: today,
                age_turning,
                is_today: true,
            });
        }

        info!("Daily pass found {} birthdays today", results.len());
        Ok(results)
    }

    async fn resolve_candidates(&self, scope: BirthdayScope, viewer: &ViewerContext) -> Vec<String> {
        match scope {
            BirthdayScope::All => self
                .members
                .list_member_ids(Some(ALL_MEMBERS_CAP))
                .await
                .unwrap_or_else(|e| {
                    warn!("Member directory unavailable: {}", e);
                    Vec::new()
                }),
            BirthdayScope::Friends => match &viewer.viewer_id {
                Some(viewer_id) => self
                    .relationships
                    .friends_of(viewer_id)
                    .await
                    .unwrap_or_else(|e| {
                        warn!("Friend lookup unavailable for {}: {}", viewer_id, e);
                        Vec::new()
                    }),
                None => Vec::new(),
            },
            BirthdayScope::Followers => match &viewer.viewer_id {
                Some(viewer_id) => self
                    .relationships
                    .following_of(viewer_id)
                    .await
                    .unwrap_or_else(|e| {
                        warn!("Following lookup unavailable for {}: {}", viewer_id, e);
                        Vec::new()
                    }),
                None => Vec::new(),
            },
        }
    }

    /// Fetch the stored birthday value: primary accessor first, direct
    /// secondary lookup only when the primary yields nothing.
    async fn fetch_birthday_value(
        &self,
        field_id: &str,
        user_id: &str,
    ) -> Option<RawBirthdayValue> {
        match self.profiles.field_value(field_id, user_id).await {
            Ok(Some(value)) => return Some(value),
            Ok(None) => {}
            Err(e) => debug!("Primary field lookup failed for {}: {}", user_id, e),
        }

        match self.profiles.field_value_raw(field_id, user_id).await {
            Ok(value) => value,
            Err(e) => {
                debug!("Fallback field lookup failed for {}: {}", user_id, e);
                None
            }
        }
    }

    async fn configured_format(&self, field_id: &str) -> String {
        self.profiles
            .field_date_format(field_id)
            .await
            .unwrap_or_else(|e| {
                debug!("Date format lookup failed for field {}: {}", field_id, e);
                None
            })
            .unwrap_or_else(|| DEFAULT_DATE_FORMAT.to_string())
    }
}

/// Sort entries per the ordering contract: every today-birthday before
/// every other entry, then ascending by next occurrence. The sort is stable
/// so same-day ties keep their insertion order.
fn sort_today_first(results: &mut [UpcomingBirthday]) {
    results.sort_by(|a, b| match (a.is_today, b.is_today) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (true, true) => Ordering::Equal,
        (false, false) => a.next_occurrence.cmp(&b.next_occurrence),
    });
}
