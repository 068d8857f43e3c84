//! services/web/src/web/state.rs
//!
//! Defines the application's shared state.

use chrono::{Local, NaiveDate};
use habit_tracker_core::ports::{
    CredentialService, EntryRepository, HabitRepository, UserRepository,
};
use std::sync::Arc;

use crate::config::Config;
use crate::web::render::Renderer;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub habits: Arc<dyn HabitRepository>,
    pub entries: Arc<dyn EntryRepository>,
    pub credentials: Arc<dyn CredentialService>,
    pub renderer: Renderer,
    pub config: Arc<Config>,
}

impl AppState {
    /// The calendar day entries are logged against: the server's local date.
    pub fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}
