//! services/web/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the persistence ports from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.
//!
//! Every statement runs under the configured timeout so a stalled backend
//! cannot hold a request indefinitely.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use habit_tracker_core::domain::{
    Frequency, Habit, HabitEntry, NewHabit, NewHabitEntry, NewUser, PasswordHash, User,
};
use habit_tracker_core::ports::{
    EntryRepository, HabitRepository, PortError, PortResult, UserRepository,
};
use sqlx::{FromRow, PgPool};
use std::future::Future;
use std::time::Duration;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the user, habit and entry ports.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
    timeout: Duration,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }

    async fn timed<T>(&self, op: impl Future<Output = PortResult<T>>) -> PortResult<T> {
        tokio::time::timeout(self.timeout, op)
            .await
            .map_err(|_| PortError::Timeout(self.timeout))?
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

fn not_found_or_unexpected(e: sqlx::Error, what: impl FnOnce() -> String) -> PortError {
    match e {
        sqlx::Error::RowNotFound => PortError::NotFound(what()),
        other => unexpected(other),
    }
}

fn user_write_error(e: sqlx::Error) -> PortError {
    match e {
        sqlx::Error::Database(ref db) if db.is_unique_violation() => PortError::DuplicateEmail,
        other => unexpected(other),
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct UserRecord {
    id: i64,
    name: String,
    email: String,
    password_hash: String,
    activated: bool,
    created_at: DateTime<Utc>,
}
impl UserRecord {
    fn to_domain(self) -> User {
        User {
            id: self.id,
            name: self.name,
            email: self.email,
            password_hash: PasswordHash::new(self.password_hash),
            active: self.activated,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct HabitRecord {
    id: i64,
    user_id: i64,
    title: String,
    description: String,
    frequency: String,
    goal: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}
impl HabitRecord {
    fn to_domain(self) -> PortResult<Habit> {
        let frequency = self
            .frequency
            .parse::<Frequency>()
            .map_err(|e| PortError::Unexpected(format!("habit {}: {}", self.id, e)))?;
        Ok(Habit {
            id: self.id,
            user_id: self.user_id,
            title: self.title,
            description: self.description,
            frequency,
            goal: self.goal,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(FromRow)]
struct EntryRecord {
    id: i64,
    habit_id: i64,
    entry_date: NaiveDate,
    status: String,
    notes: String,
    created_at: DateTime<Utc>,
}
impl EntryRecord {
    fn to_domain(self) -> HabitEntry {
        HabitEntry {
            id: self.id,
            habit_id: self.habit_id,
            entry_date: self.entry_date,
            status: self.status,
            notes: self.notes,
            created_at: self.created_at,
        }
    }
}

const USER_COLUMNS: &str = "id, name, email, password_hash, activated, created_at";
const HABIT_COLUMNS: &str =
    "id, user_id, title, description, frequency, goal, created_at, updated_at";
const ENTRY_COLUMNS: &str = "id, habit_id, entry_date, status, notes, created_at";

//=========================================================================================
// `UserRepository` Trait Implementation
//=========================================================================================

#[async_trait]
impl UserRepository for DbAdapter {
    async fn insert_user(&self, user: NewUser) -> PortResult<User> {
        let sql = format!(
            "INSERT INTO users (name, email, password_hash, activated) VALUES ($1, $2, $3, $4) \
             RETURNING {USER_COLUMNS}"
        );
        let record = self
            .timed(async {
                sqlx::query_as::<_, UserRecord>(&sql)
                    .bind(&user.name)
                    .bind(&user.email)
                    .bind(user.password_hash.as_str())
                    .bind(user.active)
                    .fetch_one(&self.pool)
                    .await
                    .map_err(user_write_error)
            })
            .await?;
        Ok(record.to_domain())
    }

    async fn get_user_by_id(&self, id: i64) -> PortResult<User> {
        if id < 1 {
            return Err(PortError::NotFound(format!("User {} not found", id)));
        }
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let record = self
            .timed(async {
                sqlx::query_as::<_, UserRecord>(&sql)
                    .bind(id)
                    .fetch_one(&self.pool)
                    .await
                    .map_err(|e| not_found_or_unexpected(e, || format!("User {} not found", id)))
            })
            .await?;
        Ok(record.to_domain())
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<User> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        let record = self
            .timed(async {
                sqlx::query_as::<_, UserRecord>(&sql)
                    .bind(email)
                    .fetch_one(&self.pool)
                    .await
                    .map_err(|e| not_found_or_unexpected(e, || "User not found".to_string()))
            })
            .await?;
        Ok(record.to_domain())
    }

    async fn update_user(&self, user: &User) -> PortResult<()> {
        let updated = self
            .timed(async {
                sqlx::query_scalar::<_, i64>(
                    "UPDATE users SET name = $1, email = $2, password_hash = $3, activated = $4 \
                     WHERE id = $5 RETURNING id",
                )
                .bind(&user.name)
                .bind(&user.email)
                .bind(user.password_hash.as_str())
                .bind(user.active)
                .bind(user.id)
                .fetch_optional(&self.pool)
                .await
                .map_err(user_write_error)
            })
            .await?;
        match updated {
            Some(_) => Ok(()),
            None => Err(PortError::NotFound(format!("User {} not found", user.id))),
        }
    }
}

//=========================================================================================
// `HabitRepository` Trait Implementation
//=========================================================================================

#[async_trait]
impl HabitRepository for DbAdapter {
    async fn insert_habit(&self, habit: NewHabit) -> PortResult<Habit> {
        let sql = format!(
            "INSERT INTO habits (user_id, title, description, frequency, goal) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {HABIT_COLUMNS}"
        );
        let record = self
            .timed(async {
                sqlx::query_as::<_, HabitRecord>(&sql)
                    .bind(habit.user_id)
                    .bind(&habit.title)
                    .bind(&habit.description)
                    .bind(habit.frequency.as_str())
                    .bind(&habit.goal)
                    .fetch_one(&self.pool)
                    .await
                    .map_err(unexpected)
            })
            .await?;
        record.to_domain()
    }

    async fn list_habits(&self, user_id: i64, frequency: Frequency) -> PortResult<Vec<Habit>> {
        let sql = format!(
            "SELECT {HABIT_COLUMNS} FROM habits WHERE user_id = $1 AND frequency = $2 \
             ORDER BY created_at DESC, id DESC"
        );
        let records = self
            .timed(async {
                sqlx::query_as::<_, HabitRecord>(&sql)
                    .bind(user_id)
                    .bind(frequency.as_str())
                    .fetch_all(&self.pool)
                    .await
                    .map_err(unexpected)
            })
            .await?;
        records.into_iter().map(HabitRecord::to_domain).collect()
    }

    async fn get_habit(&self, id: i64) -> PortResult<Habit> {
        let sql = format!("SELECT {HABIT_COLUMNS} FROM habits WHERE id = $1");
        let record = self
            .timed(async {
                sqlx::query_as::<_, HabitRecord>(&sql)
                    .bind(id)
                    .fetch_one(&self.pool)
                    .await
                    .map_err(|e| not_found_or_unexpected(e, || format!("Habit {} not found", id)))
            })
            .await?;
        record.to_domain()
    }

    async fn update_habit(&self, habit: &Habit) -> PortResult<Habit> {
        let sql = format!(
            "UPDATE habits SET title = $1, description = $2, frequency = $3, goal = $4, \
             updated_at = NOW() WHERE id = $5 AND user_id = $6 RETURNING {HABIT_COLUMNS}"
        );
        let record = self
            .timed(async {
                sqlx::query_as::<_, HabitRecord>(&sql)
                    .bind(&habit.title)
                    .bind(&habit.description)
                    .bind(habit.frequency.as_str())
                    .bind(&habit.goal)
                    .bind(habit.id)
                    .bind(habit.user_id)
                    .fetch_optional(&self.pool)
                    .await
                    .map_err(unexpected)
            })
            .await?;
        // No row means a wrong id or a habit owned by someone else.
        record
            .ok_or_else(|| PortError::NotFound(format!("Habit {} not found", habit.id)))?
            .to_domain()
    }

    async fn delete_habit(&self, id: i64, user_id: i64) -> PortResult<()> {
        let result = self
            .timed(async {
                sqlx::query("DELETE FROM habits WHERE id = $1 AND user_id = $2")
                    .bind(id)
                    .bind(user_id)
                    .execute(&self.pool)
                    .await
                    .map_err(unexpected)
            })
            .await?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Habit {} not found", id)));
        }
        Ok(())
    }
}

//=========================================================================================
// `EntryRepository` Trait Implementation
//=========================================================================================

#[async_trait]
impl EntryRepository for DbAdapter {
    async fn log_entry(&self, entry: NewHabitEntry) -> PortResult<HabitEntry> {
        let sql = format!(
            "INSERT INTO habit_entries (habit_id, entry_date, status, notes) \
             VALUES ($1, $2, $3, $4) RETURNING {ENTRY_COLUMNS}"
        );
        let record = self
            .timed(async {
                sqlx::query_as::<_, EntryRecord>(&sql)
                    .bind(entry.habit_id)
                    .bind(entry.entry_date)
                    .bind(&entry.status)
                    .bind(&entry.notes)
                    .fetch_one(&self.pool)
                    .await
                    .map_err(unexpected)
            })
            .await?;
        Ok(record.to_domain())
    }

    async fn entries_between(
        &self,
        habit_id: i64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> PortResult<Vec<HabitEntry>> {
        let sql = format!(
            "SELECT {ENTRY_COLUMNS} FROM habit_entries \
             WHERE habit_id = $1 AND entry_date BETWEEN $2 AND $3 \
             ORDER BY entry_date DESC, created_at DESC, id DESC"
        );
        let records = self
            .timed(async {
                sqlx::query_as::<_, EntryRecord>(&sql)
                    .bind(habit_id)
                    .bind(from)
                    .bind(to)
                    .fetch_all(&self.pool)
                    .await
                    .map_err(unexpected)
            })
            .await?;
        Ok(records.into_iter().map(EntryRecord::to_domain).collect())
    }

    async fn update_entry(&self, entry: &HabitEntry) -> PortResult<()> {
        let result = self
            .timed(async {
                sqlx::query("UPDATE habit_entries SET status = $1, notes = $2 WHERE id = $3")
                    .bind(&entry.status)
                    .bind(&entry.notes)
                    .bind(entry.id)
                    .execute(&self.pool)
                    .await
                    .map_err(unexpected)
            })
            .await?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Entry {} not found", entry.id)));
        }
        Ok(())
    }

    async fn delete_entry(&self, id: i64) -> PortResult<()> {
        let result = self
            .timed(async {
                sqlx::query("DELETE FROM habit_entries WHERE id = $1")
                    .bind(id)
                    .execute(&self.pool)
                    .await
                    .map_err(unexpected)
            })
            .await?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("Entry {} not found", id)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    fn lazy_adapter(timeout: Duration) -> DbAdapter {
        // The pool never connects unless a query runs.
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://user:pw@localhost:5432/none")
            .expect("lazy pool");
        DbAdapter::new(pool, timeout)
    }

    #[tokio::test]
    async fn stalled_operation_surfaces_as_timeout() {
        let adapter = lazy_adapter(Duration::from_millis(20));
        let result: PortResult<()> = adapter
            .timed(async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            })
            .await;
        assert!(matches!(result, Err(PortError::Timeout(d)) if d == Duration::from_millis(20)));
    }

    #[tokio::test]
    async fn non_positive_user_ids_skip_the_query() {
        let adapter = lazy_adapter(Duration::from_millis(50));
        let result = adapter.get_user_by_id(0).await;
        assert!(matches!(result, Err(PortError::NotFound(_))));
    }

    #[test]
    fn unknown_frequency_in_a_row_is_unexpected() {
        let record = HabitRecord {
            id: 4,
            user_id: 1,
            title: "t".into(),
            description: "d".into(),
            frequency: "monthly".into(),
            goal: "g".into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(matches!(record.to_domain(), Err(PortError::Unexpected(_))));
    }
}
