//! crates/habit_tracker_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application together with
//! the field rules each entity must satisfy before it is persisted.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, NaiveDate, Utc};
use std::fmt;
use std::str::FromStr;

use crate::validator::{self, Validator};

pub const STATUS_COMPLETED: &str = "completed";
pub const STATUS_SKIPPED: &str = "skipped";

pub const TITLE_MAX: usize = 255;
pub const DESCRIPTION_MAX: usize = 1000;
pub const GOAL_MAX: usize = 100;
pub const NOTES_MAX: usize = 1000;
pub const NAME_MAX: usize = 255;
pub const EMAIL_MAX: usize = 255;
pub const PASSWORD_MIN: usize = 8;
/// Longest plaintext accepted, in bytes.
pub const PASSWORD_MAX_BYTES: usize = 72;

//=========================================================================================
// Users
//=========================================================================================

/// A one-way password hash in PHC string format. Never holds plaintext.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    pub fn new(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordHash(..)")
    }
}

#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: PasswordHash,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

// Only used for signup - the store assigns id and creation time.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: PasswordHash,
    pub active: bool,
}

/// Name and email rules shared by signup and profile updates.
pub fn validate_user(v: &mut Validator, name: &str, email: &str) {
    v.check(validator::not_blank(name), "name", "must be provided");
    v.check(
        validator::max_length(name, NAME_MAX),
        "name",
        "must not be more than 255 characters",
    );

    validate_email(v, email);
}

pub fn validate_email(v: &mut Validator, email: &str) {
    v.check(validator::not_blank(email), "email", "must be provided");
    v.check(
        validator::max_length(email, EMAIL_MAX),
        "email",
        "must not be more than 255 characters",
    );
    v.check(
        validator::is_valid_email(email),
        "email",
        "must be a valid email address",
    );
}

/// Plaintext password rules, checked before any hashing happens.
pub fn validate_password(v: &mut Validator, password: &str) {
    v.check(
        validator::not_blank(password),
        "password",
        "Password must be provided",
    );
    v.check(
        validator::min_length(password, PASSWORD_MIN),
        "password",
        "Password must be at least 8 characters long",
    );
    v.check(
        validator::max_bytes(password, PASSWORD_MAX_BYTES),
        "password",
        "Password must not be more than 72 bytes",
    );
}

//=========================================================================================
// Habits
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Frequency {
    Daily,
    Weekly,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown frequency: {0}")]
pub struct UnknownFrequency(pub String);

impl Frequency {
    pub const ALL: [Frequency; 2] = [Frequency::Daily, Frequency::Weekly];

    pub fn as_str(self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
        }
    }

    /// Capitalised form used in page titles.
    pub fn label(self) -> &'static str {
        match self {
            Frequency::Daily => "Daily",
            Frequency::Weekly => "Weekly",
        }
    }

    /// The listing page for habits of this frequency.
    pub fn page_path(self) -> String {
        format!("/{}", self.as_str())
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = UnknownFrequency;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(Frequency::Daily),
            "weekly" => Ok(Frequency::Weekly),
            other => Err(UnknownFrequency(other.to_string())),
        }
    }
}

/// Represents a recurring task owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Habit {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: String,
    pub frequency: Frequency,
    pub goal: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewHabit {
    pub user_id: i64,
    pub title: String,
    pub description: String,
    pub frequency: Frequency,
    pub goal: String,
}

/// Raw habit fields as submitted, before the frequency has been parsed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HabitDraft {
    pub title: String,
    pub description: String,
    pub frequency: String,
    pub goal: String,
}

impl HabitDraft {
    /// Runs the habit field rules and, when they all pass, returns the
    /// validated fields with a parsed frequency.
    pub fn validate(&self, v: &mut Validator) -> Option<ValidHabit> {
        v.check(validator::not_blank(&self.title), "title", "must be provided");
        v.check(
            validator::max_length(&self.title, TITLE_MAX),
            "title",
            "must not be more than 255 characters",
        );

        v.check(
            validator::not_blank(&self.frequency),
            "frequency",
            "must be provided",
        );
        v.check(
            validator::permitted_value(self.frequency.as_str(), &["daily", "weekly"]),
            "frequency",
            "must be 'daily' or 'weekly'",
        );

        v.check(
            validator::not_blank(&self.description),
            "description",
            "must be provided",
        );
        v.check(
            validator::max_length(&self.description, DESCRIPTION_MAX),
            "description",
            "must not be more than 1000 characters",
        );

        v.check(validator::not_blank(&self.goal), "goal", "must be provided");
        v.check(
            validator::max_length(&self.goal, GOAL_MAX),
            "goal",
            "must not be more than 100 characters",
        );

        if !v.is_valid() {
            return None;
        }
        let frequency = self.frequency.parse().ok()?;
        Some(ValidHabit {
            title: self.title.clone(),
            description: self.description.clone(),
            frequency,
            goal: self.goal.clone(),
        })
    }
}

/// Habit fields that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidHabit {
    pub title: String,
    pub description: String,
    pub frequency: Frequency,
    pub goal: String,
}

impl ValidHabit {
    pub fn into_new(self, user_id: i64) -> NewHabit {
        NewHabit {
            user_id,
            title: self.title,
            description: self.description,
            frequency: self.frequency,
            goal: self.goal,
        }
    }

    /// Applies the editable fields to `habit`; id and owner never change.
    pub fn apply_to(self, habit: &mut Habit) {
        habit.title = self.title;
        habit.description = self.description;
        habit.frequency = self.frequency;
        habit.goal = self.goal;
    }
}

//=========================================================================================
// Habit entries
//=========================================================================================

/// One dated record of a habit's completion or skip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HabitEntry {
    pub id: i64,
    pub habit_id: i64,
    pub entry_date: NaiveDate,
    pub status: String,
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewHabitEntry {
    pub habit_id: i64,
    pub entry_date: NaiveDate,
    pub status: String,
    pub notes: String,
}

pub fn is_known_status(status: &str) -> bool {
    validator::permitted_value(status, &[STATUS_COMPLETED, STATUS_SKIPPED])
}

/// A habit's status for the current day, derived from its entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TodayStatus {
    Completed,
    Skipped,
    #[default]
    Empty,
}

impl TodayStatus {
    pub fn from_status(status: &str) -> Self {
        match status {
            STATUS_COMPLETED => TodayStatus::Completed,
            STATUS_SKIPPED => TodayStatus::Skipped,
            _ => TodayStatus::Empty,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TodayStatus::Completed => STATUS_COMPLETED,
            TodayStatus::Skipped => STATUS_SKIPPED,
            TodayStatus::Empty => "",
        }
    }
}

/// A habit paired with what its entries say about today.
#[derive(Debug, Clone)]
pub struct HabitWithStatus {
    pub habit: Habit,
    /// Status of the most recently logged entry for today.
    pub today: TodayStatus,
    /// Whether any entry for today is a completion.
    pub completed_today: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn draft() -> HabitDraft {
        HabitDraft {
            title: "Read".to_string(),
            description: "Read every evening".to_string(),
            frequency: "daily".to_string(),
            goal: "20 pages".to_string(),
        }
    }

    #[test]
    fn valid_draft_parses_frequency() {
        let mut v = Validator::new();
        let valid = draft().validate(&mut v).expect("draft is valid");
        assert!(v.is_valid());
        assert_eq!(valid.frequency, Frequency::Daily);
        assert_eq!(valid.into_new(7).user_id, 7);
    }

    #[rstest]
    #[case::blank_title(HabitDraft { title: "  ".into(), ..draft() }, "title", "must be provided")]
    #[case::long_title(HabitDraft { title: "x".repeat(256), ..draft() }, "title", "must not be more than 255 characters")]
    #[case::blank_frequency(HabitDraft { frequency: String::new(), ..draft() }, "frequency", "must be provided")]
    #[case::bad_frequency(HabitDraft { frequency: "monthly".into(), ..draft() }, "frequency", "must be 'daily' or 'weekly'")]
    #[case::long_description(HabitDraft { description: "d".repeat(1001), ..draft() }, "description", "must not be more than 1000 characters")]
    #[case::long_goal(HabitDraft { goal: "g".repeat(101), ..draft() }, "goal", "must not be more than 100 characters")]
    fn invalid_drafts_are_rejected(
        #[case] input: HabitDraft,
        #[case] field: &str,
        #[case] message: &str,
    ) {
        let mut v = Validator::new();
        assert!(input.validate(&mut v).is_none());
        assert_eq!(v.error(field), Some(message));
    }

    #[test]
    fn limits_are_inclusive() {
        let input = HabitDraft {
            title: "t".repeat(TITLE_MAX),
            description: "d".repeat(DESCRIPTION_MAX),
            goal: "g".repeat(GOAL_MAX),
            ..draft()
        };
        let mut v = Validator::new();
        assert!(input.validate(&mut v).is_some());
    }

    #[test]
    fn apply_keeps_identity() {
        let now = Utc::now();
        let mut habit = Habit {
            id: 3,
            user_id: 9,
            title: "Old".into(),
            description: "Old".into(),
            frequency: Frequency::Daily,
            goal: "Old".into(),
            created_at: now,
            updated_at: now,
        };
        let mut v = Validator::new();
        let valid = HabitDraft {
            frequency: "weekly".into(),
            ..draft()
        }
        .validate(&mut v)
        .expect("valid");
        valid.apply_to(&mut habit);
        assert_eq!((habit.id, habit.user_id), (3, 9));
        assert_eq!(habit.frequency, Frequency::Weekly);
        assert_eq!(habit.title, "Read");
    }

    #[rstest]
    #[case("short", "Password must be at least 8 characters long")]
    #[case("", "Password must be provided")]
    fn weak_passwords(#[case] password: &str, #[case] message: &str) {
        let mut v = Validator::new();
        validate_password(&mut v, password);
        assert_eq!(v.error("password"), Some(message));
    }

    #[test]
    fn password_cap_is_in_bytes() {
        let mut v = Validator::new();
        // 24 three-byte characters: 72 bytes.
        validate_password(&mut v, &"語".repeat(24));
        assert!(v.is_valid());

        let mut v = Validator::new();
        validate_password(&mut v, &"語".repeat(25));
        assert_eq!(
            v.error("password"),
            Some("Password must not be more than 72 bytes")
        );
    }

    #[test]
    fn user_rules_cover_name_and_email() {
        let mut v = Validator::new();
        validate_user(&mut v, "", "not-an-email");
        assert_eq!(v.error("name"), Some("must be provided"));
        assert_eq!(v.error("email"), Some("must be a valid email address"));
    }

    #[test]
    fn frequency_round_trips_through_str() {
        for f in Frequency::ALL {
            assert_eq!(f.as_str().parse::<Frequency>(), Ok(f));
        }
        assert!("Daily".parse::<Frequency>().is_err());
    }

    #[test]
    fn unknown_status_maps_to_empty() {
        assert_eq!(TodayStatus::from_status("completed"), TodayStatus::Completed);
        assert_eq!(TodayStatus::from_status("skipped"), TodayStatus::Skipped);
        assert_eq!(TodayStatus::from_status("missed"), TodayStatus::Empty);
    }
}
