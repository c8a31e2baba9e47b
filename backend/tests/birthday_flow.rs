//! End-to-end flow over in-memory collaborators: widget-style queries
//! through the cached entry point, viewer separation, and the daily
//! notification cycle with file-backed tracking surviving a restart.

use std::sync::Arc;

use birthday_tracker_backend::domain::birthday_service::BirthdayService;
use birthday_tracker_backend::domain::notification_service::NotificationService;
use birthday_tracker_backend::domain::result_cache::BirthdayCache;
use birthday_tracker_backend::storage::csv::CsvTrackingRepository;
use birthday_tracker_backend::storage::memory::{
    InMemoryCacheStore, InMemoryMemberDirectory, InMemoryProfileStore, InMemoryRelationshipStore,
    RecordingBroadcaster, RecordingMailer,
};
use chrono::NaiveDate;
use shared::{
    BirthdayQuery, BirthdayRange, BirthdayScope, MemberProfile, NotificationSettings,
    RawBirthdayValue, ViewerContext, VisibilityLevel,
};

const FIELD: &str = "field_7";

struct Site {
    profiles: Arc<InMemoryProfileStore>,
    relationships: Arc<InMemoryRelationshipStore>,
    members: Arc<InMemoryMemberDirectory>,
    service: BirthdayService,
}

fn build_site() -> Site {
    let profiles = Arc::new(InMemoryProfileStore::new());
    let relationships = Arc::new(InMemoryRelationshipStore::new());
    let members = Arc::new(InMemoryMemberDirectory::new());
    let service = BirthdayService::new(
        profiles.clone(),
        relationships.clone(),
        members.clone(),
        Arc::new(InMemoryCacheStore::new()),
    );
    Site {
        profiles,
        relationships,
        members,
        service,
    }
}

fn register(site: &Site, user_id: &str, name: &str, email: Option<&str>, birthday: &str) {
    site.members.add_member(MemberProfile {
        user_id: user_id.to_string(),
        display_name: name.to_string(),
        first_name: None,
        email: email.map(|e| e.to_string()),
    });
    site.profiles
        .set_field_value(FIELD, user_id, RawBirthdayValue::Text(birthday.to_string()));
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn monthly_query() -> BirthdayQuery {
    BirthdayQuery {
        scope: BirthdayScope::All,
        field_id: FIELD.to_string(),
        range: BirthdayRange::Monthly,
        max_results: 5,
    }
}

#[tokio::test]
async fn widget_query_orders_today_first_and_drops_rolled_over_birthdays() {
    let site = build_site();
    let today = date(2025, 6, 15);

    register(&site, "user_a", "Anna", None, "1990-06-15");
    register(&site, "user_b", "Ben", None, "1990-06-20");
    // Already passed this year; next occurrence 2026-06-10 is outside the
    // 30-day window.
    register(&site, "user_c", "Cara", None, "1990-06-10");

    let results = site
        .service
        .upcoming_birthdays(&monthly_query(), &ViewerContext::anonymous(), today)
        .await
        .unwrap();

    let ids: Vec<&str> = results.iter().map(|r| r.user_id.as_str()).collect();
    assert_eq!(ids, vec!["user_a", "user_b"]);
    assert!(results[0].is_today);
    assert!(!results[1].is_today);
    assert!(results.iter().all(|r| r.age_turning >= 1));
}

#[tokio::test]
async fn two_viewers_with_friends_scope_never_share_a_cache_entry() {
    let site = build_site();
    let today = date(2025, 6, 15);

    register(&site, "user_b", "Ben", None, "1990-06-20");
    register(&site, "user_c", "Cara", None, "1990-06-22");
    site.relationships.add_friendship("viewer_1", "user_b");
    site.relationships.add_friendship("viewer_2", "user_c");

    let query = BirthdayQuery {
        scope: BirthdayScope::Friends,
        ..monthly_query()
    };

    let viewer_1 = ViewerContext::member("viewer_1");
    let viewer_2 = ViewerContext::member("viewer_2");

    assert_ne!(
        BirthdayCache::cache_key(&query, &viewer_1),
        BirthdayCache::cache_key(&query, &viewer_2)
    );

    let for_1 = site
        .service
        .upcoming_birthdays(&query, &viewer_1, today)
        .await
        .unwrap();
    let for_2 = site
        .service
        .upcoming_birthdays(&query, &viewer_2, today)
        .await
        .unwrap();

    assert_eq!(for_1.len(), 1);
    assert_eq!(for_1[0].user_id, "user_b");
    assert_eq!(for_2.len(), 1);
    assert_eq!(for_2[0].user_id, "user_c");
}

#[tokio::test]
async fn onlyme_members_never_surface_for_any_viewer() {
    let site = build_site();
    let today = date(2025, 6, 15);

    register(&site, "user_b", "Ben", None, "1990-06-20");
    site.profiles
        .set_visibility(FIELD, "user_b", VisibilityLevel::OnlyMe);
    site.relationships.add_friendship("viewer_1", "user_b");

    for viewer in [
        ViewerContext::anonymous(),
        ViewerContext::member("viewer_1"),
        ViewerContext {
            viewer_id: Some("admin".to_string()),
            is_admin: true,
        },
    ] {
        let results = site
            .service
            .compute_upcoming(&monthly_query(), &viewer, today)
            .await
            .unwrap();
        assert!(results.is_empty(), "onlyme leaked for {:?}", viewer);
    }
}

#[tokio::test]
async fn daily_cycle_is_idempotent_across_a_process_restart() {
    let site = build_site();
    let today = date(2025, 6, 15);
    let tracking_dir = tempfile::tempdir().unwrap();

    register(&site, "user_a", "Anna", Some("anna@example.org"), "1990-06-15");
    register(&site, "user_b", "Ben", Some("ben@example.org"), "1985-01-01");

    let settings = NotificationSettings {
        default_field_id: FIELD.to_string(),
        email_enabled: true,
        activity_enabled: true,
        site_name: "Example Community".to_string(),
        ..NotificationSettings::default()
    };

    let mailer = Arc::new(RecordingMailer::new());
    let broadcaster = Arc::new(RecordingBroadcaster::new());

    // First tick of the day.
    {
        let tracking = Arc::new(CsvTrackingRepository::new(tracking_dir.path()).unwrap());
        let scheduler = NotificationService::new(
            settings.clone(),
            site.service.clone(),
            site.members.clone(),
            site.relationships.clone(),
            mailer.clone(),
            broadcaster.clone(),
            tracking,
        );
        let summary = scheduler.process_daily_birthdays(today).await.unwrap();
        assert_eq!(summary.processed.len(), 1);
        assert_eq!(summary.processed[0].display_name, "Anna");
    }

    assert_eq!(mailer.sent().len(), 1);
    assert_eq!(broadcaster.activities().len(), 1);

    // The process restarts; a second tick the same day reads the persisted
    // tracking state and dispatches nothing new.
    {
        let tracking = Arc::new(CsvTrackingRepository::new(tracking_dir.path()).unwrap());
        let scheduler = NotificationService::new(
            settings.clone(),
            site.service.clone(),
            site.members.clone(),
            site.relationships.clone(),
            mailer.clone(),
            broadcaster.clone(),
            tracking,
        );
        let summary = scheduler.process_daily_birthdays(today).await.unwrap();
        assert!(summary.processed.is_empty());
        assert_eq!(summary.skipped_already_sent, 1);
    }

    assert_eq!(mailer.sent().len(), 1);
    assert_eq!(broadcaster.activities().len(), 1);

    // Next day the tracking set rolls over and Anna's entry is gone; Ben's
    // birthday is not today, so the cycle finds nothing to do.
    {
        let tracking = Arc::new(CsvTrackingRepository::new(tracking_dir.path()).unwrap());
        let scheduler = NotificationService::new(
            settings,
            site.service.clone(),
            site.members.clone(),
            site.relationships.clone(),
            mailer.clone(),
            broadcaster.clone(),
            tracking.clone(),
        );
        let summary = scheduler
            .process_daily_birthdays(date(2025, 6, 16))
            .await
            .unwrap();
        assert!(summary.processed.is_empty());
        assert_eq!(summary.skipped_already_sent, 0);

        use birthday_tracker_backend::storage::traits::SentTrackingStore;
        assert!(!tracking.is_marked("user_a").await.unwrap());
    }
}
