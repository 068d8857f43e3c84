//! crates/habit_tracker_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or
//! password hashing libraries.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::{
    Frequency, Habit, HabitEntry, NewHabit, NewHabitEntry, NewUser, PasswordHash, User,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, hashing).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("duplicate email")]
    DuplicateEmail,
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("operation timed out after {0:?}")]
    Timeout(std::time::Duration),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Stores a new user. Fails with `DuplicateEmail` when the email is taken.
    async fn insert_user(&self, user: NewUser) -> PortResult<User>;

    async fn get_user_by_id(&self, id: i64) -> PortResult<User>;

    async fn get_user_by_email(&self, email: &str) -> PortResult<User>;

    /// Rewrites name, email, hash and active flag. `NotFound` when no row has
    /// the id, `DuplicateEmail` when the new email is taken.
    async fn update_user(&self, user: &User) -> PortResult<()>;
}

#[async_trait]
pub trait HabitRepository: Send + Sync {
    async fn insert_habit(&self, habit: NewHabit) -> PortResult<Habit>;

    /// The user's habits of one frequency, newest first.
    async fn list_habits(&self, user_id: i64, frequency: Frequency) -> PortResult<Vec<Habit>>;

    /// Fetches by id without an ownership filter; callers compare `user_id`.
    async fn get_habit(&self, id: i64) -> PortResult<Habit>;

    /// Updates the editable fields of the row matching both id and owner.
    /// Zero affected rows is reported as `NotFound`.
    async fn update_habit(&self, habit: &Habit) -> PortResult<Habit>;

    /// Deletes the row matching both id and owner.
    /// Zero affected rows is reported as `NotFound`.
    async fn delete_habit(&self, id: i64, user_id: i64) -> PortResult<()>;
}

#[async_trait]
pub trait EntryRepository: Send + Sync {
    async fn log_entry(&self, entry: NewHabitEntry) -> PortResult<HabitEntry>;

    /// Entries dated within `[from, to]` inclusive, newest date first and,
    /// within a date, most recently logged first.
    async fn entries_between(
        &self,
        habit_id: i64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> PortResult<Vec<HabitEntry>>;

    /// Rewrites status and notes.
    async fn update_entry(&self, entry: &HabitEntry) -> PortResult<()>;

    async fn delete_entry(&self, id: i64) -> PortResult<()>;
}

#[async_trait]
pub trait CredentialService: Send + Sync {
    /// Computes a salted one-way hash of `plaintext`.
    async fn hash_password(&self, plaintext: &str) -> PortResult<PasswordHash>;

    /// `Ok(false)` on mismatch; errors are reserved for unusable hashes.
    async fn verify_password(&self, hash: &PasswordHash, plaintext: &str) -> PortResult<bool>;
}
