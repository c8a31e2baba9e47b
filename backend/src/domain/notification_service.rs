//! Daily birthday notification scheduling.
//!
//! One cycle per calendar day: find today's birthdays site-wide, dispatch
//! the enabled channels for each member not yet handled today, and record
//! every member in the sent-tracking store so reruns within the same day
//! dispatch nothing twice. Channel failures are logged and never block
//! tracking or later members.

use anyhow::Result;
use chrono::{Local, NaiveDate, Utc};
use log::{debug, info, warn};
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::domain::birthday_service::BirthdayService;
use crate::storage::traits::{
    ActivityBroadcaster, Mailer, MemberDirectory, RelationshipStore, SentTrackingStore,
};
use shared::{
    DailySummary, MemberProfile, NotificationAudience, NotificationSettings, ProcessedBirthday,
    UpcomingBirthday,
};

/// Upper bound on in-app notification recipients per birthday when
/// broadcasting to all members.
pub const NOTIFY_RECIPIENTS_CAP: usize = 500;

/// Action tag delivered with in-app birthday notifications.
pub const NOTIFICATION_ACTION: &str = "birthday_today";

/// Whether the tracking set belongs to an earlier day and must be reset.
pub fn should_reset_tracking(last_processed: Option<NaiveDate>, today: NaiveDate) -> bool {
    last_processed != Some(today)
}

/// Replace `{placeholder}` tokens in a notification template.
pub fn render_template(template: &str, replacements: &[(&str, String)]) -> String {
    replacements
        .iter()
        .fold(template.to_string(), |text, (token, value)| {
            text.replace(token, value)
        })
}

/// Service running the once-daily notification pass.
#[derive(Clone)]
pub struct NotificationService {
    settings: NotificationSettings,
    birthdays: BirthdayService,
    members: Arc<dyn MemberDirectory>,
    relationships: Arc<dyn RelationshipStore>,
    mailer: Arc<dyn Mailer>,
    broadcaster: Arc<dyn ActivityBroadcaster>,
    tracking: Arc<dyn SentTrackingStore>,
    // Serializes the whole daily cycle so overlapping ticks cannot race the
    // check-then-mark sequence.
    cycle_lock: Arc<Mutex<()>>,
}

impl NotificationService {
    /// Create a new NotificationService.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        settings: NotificationSettings,
        birthdays: BirthdayService,
        members: Arc<dyn MemberDirectory>,
        relationships: Arc<dyn RelationshipStore>,
        mailer: Arc<dyn Mailer>,
        broadcaster: Arc<dyn ActivityBroadcaster>,
        tracking: Arc<dyn SentTrackingStore>,
    ) -> Self {
        Self {
            settings,
            birthdays,
            members,
            relationships,
            mailer,
            broadcaster,
            tracking,
            cycle_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Manually trigger the daily cycle for the current local date.
    pub async fn trigger_now(&self) -> Result<DailySummary> {
        self.process_daily_birthdays(Local::now().date_naive()).await
    }

    /// Run one daily cycle: the external scheduler calls this on every
    /// tick, which may be more often than once a day — the tracking store
    /// keeps dispatch at-most-once per member per day.
    pub async fn process_daily_birthdays(&self, today: NaiveDate) -> Result<DailySummary> {
        let _cycle = self.cycle_lock.lock().await;

        self.check_day_rollover(today).await?;

        let todays = self
            .birthdays
            .todays_birthdays(&self.settings.default_field_id, today)
            .await?;

        let mut processed = Vec::new();
        let mut skipped_already_sent = 0;

        for entry in &todays {
            let already_sent = self
                .tracking
                .is_marked(&entry.user_id)
                .await
                .unwrap_or_else(|e| {
                    warn!("Sent-tracking lookup failed for {}: {}", entry.user_id, e);
                    false
                });
            if already_sent {
                skipped_already_sent += 1;
                continue;
            }

            let member = self.lookup_member(&entry.user_id).await;
            self.dispatch_channels(entry, &member).await;

            // Mark regardless of channel outcomes; a permanently failing
            // channel must not cause a retry storm tomorrow's rollover
            // would not fix.
            if let Err(e) = self
                .tracking
                .mark_sent(&entry.user_id, Utc::now().timestamp())
                .await
            {
                warn!("Failed to record sent-tracking for {}: {}", entry.user_id, e);
            }

            processed.push(ProcessedBirthday {
                user_id: entry.user_id.clone(),
                display_name: member.display_name.clone(),
                age_turning: entry.age_turning,
            });
        }

        if self.settings.admin_email_enabled && !processed.is_empty() {
            if let Err(e) = self.send_admin_summary(&processed).await {
                warn!("Admin summary dispatch failed: {}", e);
            }
        }

        info!(
            "Daily birthday cycle for {}: {} processed, {} already sent",
            today,
            processed.len(),
            skipped_already_sent
        );

        Ok(DailySummary {
            date: today,
            processed,
            skipped_already_sent,
        })
    }

    async fn check_day_rollover(&self, today: NaiveDate) -> Result<()> {
        let last_processed = self.tracking.last_processed_date().await?;
        if should_reset_tracking(last_processed, today) {
            info!(
                "Day rollover ({:?} -> {}); clearing sent tracking",
                last_processed, today
            );
            self.tracking.clear().await?;
            self.tracking.set_last_processed_date(today).await?;
            // Daily cache safety net rides on the same rollover check.
            self.birthdays.cache().daily_flush();
        }
        Ok(())
    }

    /// Directory lookup with a minimal stand-in when the row is missing, so
    /// a stale directory cannot stall the cycle.
    async fn lookup_member(&self, user_id: &str) -> MemberProfile {
        match self.members.get_member(user_id).await {
            Ok(Some(member)) => member,
            Ok(None) => {
                debug!("No directory row for {}; using bare id", user_id);
                MemberProfile {
                    user_id: user_id.to_string(),
                    display_name: user_id.to_string(),
                    first_name: None,
                    email: None,
                }
            }
            Err(e) => {
                warn!("Member directory lookup failed for {}: {}", user_id, e);
                MemberProfile {
                    user_id: user_id.to_string(),
                    display_name: user_id.to_string(),
                    first_name: None,
                    email: None,
                }
            }
        }
    }

    /// Fire every enabled channel for one member, best-effort.
    async fn dispatch_channels(&self, entry: &UpcomingBirthday, member: &MemberProfile) {
        if self.settings.email_enabled {
            if let Err(e) = self.send_birthday_email(entry, member).await {
                warn!("Birthday email failed for {}: {}", entry.user_id, e);
            }
        }

        if self.settings.activity_enabled {
            if let Err(e) = self.post_birthday_activity(entry, member).await {
                warn!("Activity post failed for {}: {}", entry.user_id, e);
            }
        }

        if self.settings.notification_enabled {
            self.fan_out_notifications(entry).await;
        }
    }

    async fn send_birthday_email(
        &self,
        entry: &UpcomingBirthday,
        member: &MemberProfile,
    ) -> Result<()> {
        let Some(email) = &member.email else {
            debug!("No email address for {}; skipping birthday mail", entry.user_id);
            return Ok(());
        };

        let replacements = self.replacements_for(entry, member);
        let subject = render_template(&self.settings.email_subject, &replacements);
        let body_template = if self.settings.email_message.is_empty() {
            default_email_body()
        } else {
            self.settings.email_message.clone()
        };
        let body = render_template(&body_template, &replacements);

        self.mailer.send(email, &subject, &body).await
    }

    async fn post_birthday_activity(
        &self,
        entry: &UpcomingBirthday,
        member: &MemberProfile,
    ) -> Result<()> {
        let replacements = self.replacements_for(entry, member);
        let message = render_template(&self.settings.activity_message, &replacements);
        self.broadcaster.post_activity(&entry.user_id, &message).await
    }

    /// In-app notification fan-out: the member's friends, or every member
    /// up to the broadcast cap. One failing recipient never stops the rest.
    async fn fan_out_notifications(&self, entry: &UpcomingBirthday) {
        let recipients = match self.settings.notification_audience {
            NotificationAudience::FriendsOnly => self
                .relationships
                .friends_of(&entry.user_id)
                .await
                .unwrap_or_else(|e| {
                    warn!("Friend lookup failed for {}: {}", entry.user_id, e);
                    Vec::new()
                }),
            NotificationAudience::AllMembers => self
                .members
                .list_member_ids(Some(NOTIFY_RECIPIENTS_CAP))
                .await
                .unwrap_or_else(|e| {
                    warn!("Member listing failed for notification fan-out: {}", e);
                    Vec::new()
                }),
        };

        for recipient in recipients {
            if recipient == entry.user_id {
                continue;
            }
            if let Err(e) = self
                .broadcaster
                .notify(&recipient, &entry.user_id, NOTIFICATION_ACTION)
                .await
            {
                warn!(
                    "In-app notification to {} about {} failed: {}",
                    recipient, entry.user_id, e
                );
            }
        }
    }

    async fn send_admin_summary(&self, processed: &[ProcessedBirthday]) -> Result<()> {
        let recipient = if !self.settings.admin_email.is_empty() {
            self.settings.admin_email.clone()
        } else {
            self.settings.site_admin_email.clone()
        };
        if recipient.is_empty() {
            debug!("No admin address configured; skipping summary mail");
            return Ok(());
        }

        let subject = format!(
            "[{}] {} Birthday(s) Today",
            self.settings.site_name,
            processed.len()
        );

        let mut body = String::from("Today's Birthdays:\n");
        for birthday in processed {
            body.push_str(&format!(
                "- {} (Turning {})\n",
                birthday.display_name, birthday.age_turning
            ));
        }

        self.mailer.send(&recipient, &subject, &body).await
    }

    fn replacements_for(
        &self,
        entry: &UpcomingBirthday,
        member: &MemberProfile,
    ) -> Vec<(&'static str, String)> {
        let first_name = member
            .first_name
            .clone()
            .unwrap_or_else(|| member.display_name.clone());
        vec![
            ("{name}", member.display_name.clone()),
            ("{first_name}", first_name),
            ("{age}", entry.age_turning.to_string()),
            ("{site_name}", self.settings.site_name.clone()),
        ]
    }
}

fn default_email_body() -> String {
    [
        "Dear {first_name},",
        "",
        "Wishing you a very Happy Birthday! May your special day be filled with joy, laughter, and wonderful moments.",
        "",
        "The entire {site_name} community sends you warm birthday wishes!",
        "",
        "Best wishes,",
        "{site_name}",
    ]
    .join("\n")
}
