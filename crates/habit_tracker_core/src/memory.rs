//! crates/habit_tracker_core/src/memory.rs
//!
//! In-memory implementations of every port. They follow the same contracts as
//! the PostgreSQL adapter (ownership filters, ordering, duplicate detection)
//! so handler tests exercise real semantics without a database.

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::domain::{
    Frequency, Habit, HabitEntry, NewHabit, NewHabitEntry, NewUser, PasswordHash, User,
};
use crate::ports::{
    CredentialService, EntryRepository, HabitRepository, PortError, PortResult, UserRepository,
};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    habits: Vec<Habit>,
    entries: Vec<HabitEntry>,
    next_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// A single store backing users, habits and entries.
#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
    writes: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful write operations so far.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Every habit regardless of owner, oldest first.
    pub fn all_habits(&self) -> Vec<Habit> {
        self.lock().map(|t| t.habits.clone()).unwrap_or_default()
    }

    /// Every entry regardless of habit, in insertion order.
    pub fn all_entries(&self) -> Vec<HabitEntry> {
        self.lock().map(|t| t.entries.clone()).unwrap_or_default()
    }

    fn lock(&self) -> PortResult<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| PortError::Unexpected("in-memory store lock poisoned".to_string()))
    }

    fn wrote(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn insert_user(&self, user: NewUser) -> PortResult<User> {
        let mut tables = self.lock()?;
        if tables.users.iter().any(|u| u.email == user.email) {
            return Err(PortError::DuplicateEmail);
        }
        let stored = User {
            id: tables.next_id(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            active: user.active,
            created_at: Utc::now(),
        };
        tables.users.push(stored.clone());
        self.wrote();
        Ok(stored)
    }

    async fn get_user_by_id(&self, id: i64) -> PortResult<User> {
        self.lock()?
            .users
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", id)))
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<User> {
        self.lock()?
            .users
            .iter()
            .find(|u| u.email == email)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", email)))
    }

    async fn update_user(&self, user: &User) -> PortResult<()> {
        let mut tables = self.lock()?;
        if tables
            .users
            .iter()
            .any(|u| u.id != user.id && u.email == user.email)
        {
            return Err(PortError::DuplicateEmail);
        }
        let row = tables
            .users
            .iter_mut()
            .find(|u| u.id == user.id)
            .ok_or_else(|| PortError::NotFound(format!("User {} not found", user.id)))?;
        row.name = user.name.clone();
        row.email = user.email.clone();
        row.password_hash = user.password_hash.clone();
        row.active = user.active;
        self.wrote();
        Ok(())
    }
}

#[async_trait]
impl HabitRepository for InMemoryStore {
    async fn insert_habit(&self, habit: NewHabit) -> PortResult<Habit> {
        let mut tables = self.lock()?;
        let now = Utc::now();
        let stored = Habit {
            id: tables.next_id(),
            user_id: habit.user_id,
            title: habit.title,
            description: habit.description,
            frequency: habit.frequency,
            goal: habit.goal,
            created_at: now,
            updated_at: now,
        };
        tables.habits.push(stored.clone());
        self.wrote();
        Ok(stored)
    }

    async fn list_habits(&self, user_id: i64, frequency: Frequency) -> PortResult<Vec<Habit>> {
        let tables = self.lock()?;
        let mut habits: Vec<Habit> = tables
            .habits
            .iter()
            .filter(|h| h.user_id == user_id && h.frequency == frequency)
            .cloned()
            .collect();
        habits.sort_by(|a, b| (b.created_at, b.id).cmp(&(a.created_at, a.id)));
        Ok(habits)
    }

    async fn get_habit(&self, id: i64) -> PortResult<Habit> {
        self.lock()?
            .habits
            .iter()
            .find(|h| h.id == id)
            .cloned()
            .ok_or_else(|| PortError::NotFound(format!("Habit {} not found", id)))
    }

    async fn update_habit(&self, habit: &Habit) -> PortResult<Habit> {
        let mut tables = self.lock()?;
        let row = tables
            .habits
            .iter_mut()
            .find(|h| h.id == habit.id && h.user_id == habit.user_id)
            .ok_or_else(|| PortError::NotFound(format!("Habit {} not found", habit.id)))?;
        row.title = habit.title.clone();
        row.description = habit.description.clone();
        row.frequency = habit.frequency;
        row.goal = habit.goal.clone();
        row.updated_at = Utc::now();
        let updated = row.clone();
        self.wrote();
        Ok(updated)
    }

    async fn delete_habit(&self, id: i64, user_id: i64) -> PortResult<()> {
        let mut tables = self.lock()?;
        let before = tables.habits.len();
        tables
            .habits
            .retain(|h| !(h.id == id && h.user_id == user_id));
        if tables.habits.len() == before {
            return Err(PortError::NotFound(format!("Habit {} not found", id)));
        }
        tables.entries.retain(|e| e.habit_id != id);
        self.wrote();
        Ok(())
    }
}

#[async_trait]
impl EntryRepository for InMemoryStore {
    async fn log_entry(&self, entry: NewHabitEntry) -> PortResult<HabitEntry> {
        let mut tables = self.lock()?;
        if !tables.habits.iter().any(|h| h.id == entry.habit_id) {
            return Err(PortError::Unexpected(format!(
                "habit {} does not exist",
                entry.habit_id
            )));
        }
        let stored = HabitEntry {
            id: tables.next_id(),
            habit_id: entry.habit_id,
            entry_date: entry.entry_date,
            status: entry.status,
            notes: entry.notes,
            created_at: Utc::now(),
        };
        tables.entries.push(stored.clone());
        self.wrote();
        Ok(stored)
    }

    async fn entries_between(
        &self,
        habit_id: i64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> PortResult<Vec<HabitEntry>> {
        let tables = self.lock()?;
        let mut entries: Vec<HabitEntry> = tables
            .entries
            .iter()
            .filter(|e| e.habit_id == habit_id && e.entry_date >= from && e.entry_date <= to)
            .cloned()
            .collect();
        entries.sort_by(|a, b| {
            (b.entry_date, b.created_at, b.id).cmp(&(a.entry_date, a.created_at, a.id))
        });
        Ok(entries)
    }

    async fn update_entry(&self, entry: &HabitEntry) -> PortResult<()> {
        let mut tables = self.lock()?;
        let row = tables
            .entries
            .iter_mut()
            .find(|e| e.id == entry.id)
            .ok_or_else(|| PortError::NotFound(format!("Entry {} not found", entry.id)))?;
        row.status = entry.status.clone();
        row.notes = entry.notes.clone();
        self.wrote();
        Ok(())
    }

    async fn delete_entry(&self, id: i64) -> PortResult<()> {
        let mut tables = self.lock()?;
        let before = tables.entries.len();
        tables.entries.retain(|e| e.id != id);
        if tables.entries.len() == before {
            return Err(PortError::NotFound(format!("Entry {} not found", id)));
        }
        self.wrote();
        Ok(())
    }
}

/// Reversible stand-in for a real password hash. Test use only.
#[derive(Debug, Clone, Copy, Default)]
pub struct FakeCredentials;

#[async_trait]
impl CredentialService for FakeCredentials {
    async fn hash_password(&self, plaintext: &str) -> PortResult<PasswordHash> {
        Ok(PasswordHash::new(format!("fake${plaintext}")))
    }

    async fn verify_password(&self, hash: &PasswordHash, plaintext: &str) -> PortResult<bool> {
        match hash.as_str().strip_prefix("fake$") {
            Some(stored) => Ok(stored == plaintext),
            None => Err(PortError::Unexpected("not a fake hash".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::STATUS_COMPLETED;

    fn new_habit(user_id: i64, title: &str) -> NewHabit {
        NewHabit {
            user_id,
            title: title.to_string(),
            description: "desc".to_string(),
            frequency: Frequency::Daily,
            goal: "goal".to_string(),
        }
    }

    #[tokio::test]
    async fn ownership_filters_update_and_delete() {
        let store = InMemoryStore::new();
        let mut habit = store.insert_habit(new_habit(1, "Run")).await.expect("insert");

        habit.user_id = 2;
        assert!(matches!(
            store.update_habit(&habit).await,
            Err(PortError::NotFound(_))
        ));
        assert!(matches!(
            store.delete_habit(habit.id, 2).await,
            Err(PortError::NotFound(_))
        ));
        assert!(store.delete_habit(habit.id, 1).await.is_ok());
        assert!(matches!(
            store.delete_habit(habit.id, 1).await,
            Err(PortError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn listing_is_newest_first_and_scoped() {
        let store = InMemoryStore::new();
        let first = store.insert_habit(new_habit(1, "First")).await.expect("insert");
        let second = store.insert_habit(new_habit(1, "Second")).await.expect("insert");
        store.insert_habit(new_habit(2, "Theirs")).await.expect("insert");

        let listed = store.list_habits(1, Frequency::Daily).await.expect("list");
        let ids: Vec<i64> = listed.iter().map(|h| h.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
        assert!(store
            .list_habits(1, Frequency::Weekly)
            .await
            .expect("list")
            .is_empty());
    }

    #[tokio::test]
    async fn entries_update_and_delete() {
        let store = InMemoryStore::new();
        let habit = store.insert_habit(new_habit(1, "Run")).await.expect("insert");
        let today = Utc::now().date_naive();
        let mut entry = store
            .log_entry(NewHabitEntry {
                habit_id: habit.id,
                entry_date: today,
                status: "skipped".to_string(),
                notes: String::new(),
            })
            .await
            .expect("log");

        entry.status = STATUS_COMPLETED.to_string();
        store.update_entry(&entry).await.expect("update");
        let fetched = store
            .entries_between(habit.id, today, today)
            .await
            .expect("entries");
        assert_eq!(fetched[0].status, STATUS_COMPLETED);

        store.delete_entry(entry.id).await.expect("delete");
        assert!(matches!(
            store.delete_entry(entry.id).await,
            Err(PortError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn user_update_reports_duplicates() {
        let store = InMemoryStore::new();
        let hash = PasswordHash::new("fake$pw");
        let new_user = |email: &str| NewUser {
            name: "N".to_string(),
            email: email.to_string(),
            password_hash: hash.clone(),
            active: true,
        };
        store.insert_user(new_user("a@example.com")).await.expect("a");
        let mut b = store.insert_user(new_user("b@example.com")).await.expect("b");

        b.email = "a@example.com".to_string();
        assert!(matches!(
            store.update_user(&b).await,
            Err(PortError::DuplicateEmail)
        ));

        b.id = 999;
        b.email = "c@example.com".to_string();
        assert!(matches!(
            store.update_user(&b).await,
            Err(PortError::NotFound(_))
        ));
    }
}
