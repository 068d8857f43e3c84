//! crates/habit_tracker_core/src/progress.rs
//!
//! Today's status and completion progress, recomputed from the store on every
//! request.

use chrono::NaiveDate;

use crate::domain::{Frequency, Habit, HabitEntry, HabitWithStatus, TodayStatus, STATUS_COMPLETED};
use crate::ports::{EntryRepository, HabitRepository, PortResult};

/// Completion of one frequency's habits for today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
    /// `floor(completed * 100 / total)`, 0 when there are no habits.
    pub percent: u8,
}

impl Progress {
    pub fn new(completed: usize, total: usize) -> Self {
        let completed = completed.min(total);
        Self {
            completed,
            total,
            percent: percentage(completed, total),
        }
    }

    pub fn from_habits(habits: &[HabitWithStatus]) -> Self {
        let completed = habits.iter().filter(|h| h.completed_today).count();
        Self::new(completed, habits.len())
    }
}

pub fn percentage(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let percent = completed.min(total) * 100 / total;
    u8::try_from(percent).unwrap_or(100)
}

/// Status of the first entry dated `day`. Entries arrive newest first, so this
/// is the most recently logged one.
pub fn status_on(entries: &[HabitEntry], day: NaiveDate) -> TodayStatus {
    entries
        .iter()
        .find(|entry| entry.entry_date == day)
        .map(|entry| TodayStatus::from_status(&entry.status))
        .unwrap_or_default()
}

/// True once any entry dated `day` is a completion; later entries for the
/// same day do not undo it.
pub fn completed_on(entries: &[HabitEntry], day: NaiveDate) -> bool {
    entries
        .iter()
        .any(|entry| entry.entry_date == day && entry.status == STATUS_COMPLETED)
}

/// A frequency's habits with today's status, plus the progress they add up to.
#[derive(Debug, Clone, Default)]
pub struct Overview {
    pub habits: Vec<HabitWithStatus>,
    pub progress: Progress,
}

/// Loads the user's habits of `frequency` and resolves each one's entries for
/// `today`.
pub async fn overview(
    habits: &dyn HabitRepository,
    entries: &dyn EntryRepository,
    user_id: i64,
    frequency: Frequency,
    today: NaiveDate,
) -> PortResult<Overview> {
    let owned = habits.list_habits(user_id, frequency).await?;

    let mut resolved = Vec::with_capacity(owned.len());
    for habit in owned {
        let todays = entries.entries_between(habit.id, today, today).await?;
        resolved.push(HabitWithStatus {
            today: status_on(&todays, today),
            completed_today: completed_on(&todays, today),
            habit,
        });
    }

    let progress = Progress::from_habits(&resolved);
    Ok(Overview {
        habits: resolved,
        progress,
    })
}

/// Resolves today's status for a single habit.
pub async fn with_status(
    entries: &dyn EntryRepository,
    habit: Habit,
    today: NaiveDate,
) -> PortResult<HabitWithStatus> {
    let todays = entries.entries_between(habit.id, today, today).await?;
    Ok(HabitWithStatus {
        today: status_on(&todays, today),
        completed_today: completed_on(&todays, today),
        habit,
    })
}
