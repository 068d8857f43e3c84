pub mod auth;
pub mod domain;
pub mod ports;
pub mod progress;
pub mod validator;

#[cfg(any(test, feature = "test-support"))]
pub mod memory;

pub use domain::{
    Frequency, Habit, HabitDraft, HabitEntry, HabitWithStatus, NewHabit, NewHabitEntry, NewUser,
    PasswordHash, TodayStatus, User, ValidHabit,
};
pub use ports::{
    CredentialService, EntryRepository, HabitRepository, PortError, PortResult, UserRepository,
};
pub use progress::{Overview, Progress};
pub use validator::{FieldErrors, Validator};
