use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A member's stored birthday value, exactly as the profile system holds it.
///
/// Profile fields accumulate data in several shapes over a site's lifetime:
/// a plain string, a positional list, or a keyed record. The parser pattern
/// matches on these named cases rather than guessing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RawBirthdayValue {
    /// A plain date string, e.g. "1990-03-15" or "15/03/1990 00:00:00"
    Text(String),
    /// A positional list whose first element carries the date string
    List(Vec<String>),
    /// A keyed record carrying the date string under the "date" key
    Record(BTreeMap<String, String>),
}

impl RawBirthdayValue {
    /// Extract the candidate date string from whichever shape this value has.
    ///
    /// Returns `None` when the shape carries no usable string (empty list,
    /// record without a "date" key).
    pub fn date_string(&self) -> Option<&str> {
        match self {
            RawBirthdayValue::Text(s) => Some(s.as_str()),
            RawBirthdayValue::List(items) => items.first().map(|s| s.as_str()),
            RawBirthdayValue::Record(entries) => entries.get("date").map(|s| s.as_str()),
        }
    }
}

/// Visibility level attached to a member's birthday field.
///
/// The closed set mirrors the profile system's levels; anything else arrives
/// as `Other` and is treated as visible (custom levels are permissive).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum VisibilityLevel {
    Public,
    LoggedIn,
    AdminsOnly,
    Friends,
    OnlyMe,
    Other(String),
}

impl VisibilityLevel {
    /// Parse the profile store's string tag into a visibility level.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "public" => VisibilityLevel::Public,
            "loggedin" => VisibilityLevel::LoggedIn,
            "adminsonly" => VisibilityLevel::AdminsOnly,
            "friends" => VisibilityLevel::Friends,
            "onlyme" => VisibilityLevel::OnlyMe,
            other => VisibilityLevel::Other(other.to_string()),
        }
    }
}

impl fmt::Display for VisibilityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VisibilityLevel::Public => write!(f, "public"),
            VisibilityLevel::LoggedIn => write!(f, "loggedin"),
            VisibilityLevel::AdminsOnly => write!(f, "adminsonly"),
            VisibilityLevel::Friends => write!(f, "friends"),
            VisibilityLevel::OnlyMe => write!(f, "onlyme"),
            VisibilityLevel::Other(tag) => write!(f, "{}", tag),
        }
    }
}

/// The user on whose behalf a birthday query runs.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ViewerContext {
    /// ID of the logged-in viewer, `None` for anonymous/batch contexts
    pub viewer_id: Option<String>,
    /// Whether the viewer holds administrative privilege
    pub is_admin: bool,
}

impl ViewerContext {
    /// Context for an anonymous visitor.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Context for a logged-in member.
    pub fn member(viewer_id: impl Into<String>) -> Self {
        Self {
            viewer_id: Some(viewer_id.into()),
            is_admin: false,
        }
    }
}

/// Which members are candidates for a birthday query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BirthdayScope {
    /// Every member, up to a bounded cap
    All,
    /// The viewer's accepted friends
    Friends,
    /// The members the viewer follows
    Followers,
}

/// Forward-looking window a next occurrence must fall into.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BirthdayRange {
    /// Next 365 days (effectively everyone with a valid date)
    NoLimit,
    /// Next 7 days
    Weekly,
    /// Next 30 days
    Monthly,
}

impl BirthdayRange {
    /// Window length in days.
    pub fn days(&self) -> i64 {
        match self {
            BirthdayRange::NoLimit => 365,
            BirthdayRange::Weekly => 7,
            BirthdayRange::Monthly => 30,
        }
    }
}

/// Caller-supplied configuration for one birthday query.
///
/// Also serves as cache-key material after deterministic serialization, so
/// field order matters for key stability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BirthdayQuery {
    pub scope: BirthdayScope,
    /// Identifier of the profile field holding the birth date
    pub field_id: String,
    pub range: BirthdayRange,
    /// Display-count hint for callers; the engine never truncates
    pub max_results: usize,
}

impl Default for BirthdayQuery {
    fn default() -> Self {
        Self {
            scope: BirthdayScope::All,
            field_id: String::new(),
            range: BirthdayRange::NoLimit,
            max_results: 5,
        }
    }
}

/// One entry of the engine's output: a member with an upcoming birthday.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpcomingBirthday {
    pub user_id: String,
    /// Canonical birth date (year 1900..=current)
    pub birth_date: NaiveDate,
    /// Nearest occurrence of the birthday on or after today, leap-adjusted
    pub next_occurrence: NaiveDate,
    /// Age the member turns on that occurrence, always >= 1
    pub age_turning: i32,
    /// Whether the birthday's month/day equals today's (year-independent)
    pub is_today: bool,
}

/// Directory row for a member, used by the notification pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberProfile {
    pub user_id: String,
    pub display_name: String,
    pub first_name: Option<String>,
    pub email: Option<String>,
}

/// Who receives the in-app birthday notification fan-out.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationAudience {
    /// Broadcast to all members (bounded)
    AllMembers,
    /// Only the birthday member's accepted friends
    FriendsOnly,
}

/// Admin-configured settings for the daily notification pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationSettings {
    /// Profile field the daily pass reads birthdays from
    pub default_field_id: String,

    /// Send a birthday email to the member
    pub email_enabled: bool,
    pub email_subject: String,
    /// Email body template; empty string means the built-in default body
    pub email_message: String,

    /// Send a daily summary mail to the admin
    pub admin_email_enabled: bool,
    /// Summary recipient; empty string falls back to `site_admin_email`
    pub admin_email: String,

    /// Post a celebration entry to the activity feed
    pub activity_enabled: bool,
    pub activity_message: String,

    /// Send in-app notifications to other members
    pub notification_enabled: bool,
    pub notification_audience: NotificationAudience,
    pub notification_text: String,

    /// Site identity used in templates and summary mail
    pub site_name: String,
    pub site_admin_email: String,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            default_field_id: String::new(),
            email_enabled: false,
            email_subject: "Happy Birthday, {name}!".to_string(),
            email_message: String::new(),
            admin_email_enabled: false,
            admin_email: String::new(),
            activity_enabled: false,
            activity_message: "Today is {name}'s birthday! Send your wishes!".to_string(),
            notification_enabled: false,
            notification_audience: NotificationAudience::AllMembers,
            notification_text: "It's {name}'s birthday today!".to_string(),
            site_name: String::new(),
            site_admin_email: String::new(),
        }
    }
}

/// One member processed by a scheduler cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedBirthday {
    pub user_id: String,
    pub display_name: String,
    pub age_turning: i32,
}

/// Result of one daily notification cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySummary {
    pub date: NaiveDate,
    /// Members dispatched to during this cycle, in processing order
    pub processed: Vec<ProcessedBirthday>,
    /// Members skipped because an earlier cycle already handled them today
    pub skipped_already_sent: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_value_date_string_extraction() {
        let text = RawBirthdayValue::Text("1990-03-15".to_string());
        assert_eq!(text.date_string(), Some("1990-03-15"));

        let list = RawBirthdayValue::List(vec!["1990-03-15".to_string(), "extra".to_string()]);
        assert_eq!(list.date_string(), Some("1990-03-15"));

        let mut entries = BTreeMap::new();
        entries.insert("date".to_string(), "1990-03-15".to_string());
        let record = RawBirthdayValue::Record(entries);
        assert_eq!(record.date_string(), Some("1990-03-15"));

        assert_eq!(RawBirthdayValue::List(vec![]).date_string(), None);
        assert_eq!(
            RawBirthdayValue::Record(BTreeMap::new()).date_string(),
            None
        );
    }

    #[test]
    fn test_visibility_level_round_trip() {
        for tag in ["public", "loggedin", "adminsonly", "friends", "onlyme"] {
            assert_eq!(VisibilityLevel::from_tag(tag).to_string(), tag);
        }
        assert_eq!(
            VisibilityLevel::from_tag("groupmembers"),
            VisibilityLevel::Other("groupmembers".to_string())
        );
    }

    #[test]
    fn test_range_days() {
        assert_eq!(BirthdayRange::NoLimit.days(), 365);
        assert_eq!(BirthdayRange::Weekly.days(), 7);
        assert_eq!(BirthdayRange::Monthly.days(), 30);
    }

    #[test]
    fn test_query_serialization_is_deterministic() {
        let query = BirthdayQuery {
            scope: BirthdayScope::Friends,
            field_id: "field_7".to_string(),
            range: BirthdayRange::Monthly,
            max_results: 5,
        };
        let a = serde_json::to_string(&query).unwrap();
        let b = serde_json::to_string(&query.clone()).unwrap();
        assert_eq!(a, b);
        assert!(a.contains("\"friends\""));
        assert!(a.contains("\"monthly\""));
    }
}
