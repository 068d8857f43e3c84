//! services/web/src/web/entries.rs
//!
//! Logging completions and skips, the entries table and the progress fragment.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Response,
    Extension,
};
use chrono::Days;
use habit_tracker_core::{
    domain::{is_known_status, Frequency, NewHabitEntry, NOTES_MAX},
    progress,
    validator,
};
use std::sync::Arc;
use tracing::info;

use crate::web::error::{AppError, WebResult};
use crate::web::forms::{parse_frequency, parse_id, EntryForm, ParsedForm};
use crate::web::habits::owned_habit;
use crate::web::middleware::CurrentUser;
use crate::web::render::PageData;
use crate::web::response::{with_trigger, ResponseMode, REFRESH_PROGRESS_EVENT};
use crate::web::session::SessionContext;
use crate::web::state::AppState;
use crate::web::views::{self, EntryTable};

/// How many days, today included, the entries table covers.
fn window_days(frequency: Frequency) -> u64 {
    match frequency {
        Frequency::Daily => 7,
        Frequency::Weekly => 28,
    }
}

pub async fn log_entry(
    State(state): State<Arc<AppState>>,
    session: SessionContext,
    mode: ResponseMode,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(id): Path<String>,
    ParsedForm(form): ParsedForm<EntryForm>,
) -> WebResult<Response> {
    let id = parse_id(&id)?;
    if !is_known_status(&form.status) {
        return Err(AppError::BadRequest(format!(
            "unknown entry status: {}",
            form.status
        )));
    }
    if !validator::max_length(&form.notes, NOTES_MAX) {
        return Err(AppError::BadRequest("notes are too long".to_string()));
    }

    let habit = owned_habit(&state, id, user_id).await?;
    let today = state.today();
    let entry = state
        .entries
        .log_entry(NewHabitEntry {
            habit_id: habit.id,
            entry_date: today,
            status: form.status,
            notes: form.notes,
        })
        .await?;
    info!(habit_id = habit.id, entry_id = entry.id, status = %entry.status, "Entry logged");

    if mode.is_incremental() {
        let item = progress::with_status(state.entries.as_ref(), habit, today).await?;
        let token = session.csrf_token().await?;
        let response = state
            .renderer
            .html(StatusCode::OK, |out| views::habit_item(out, &token, &item))?;
        return Ok(with_trigger(response, REFRESH_PROGRESS_EVENT));
    }

    Ok(mode.redirect(&habit.frequency.page_path()))
}

pub async fn entries_page(
    State(state): State<Arc<AppState>>,
    session: SessionContext,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(frequency): Path<String>,
) -> WebResult<Response> {
    let frequency = parse_frequency(&frequency)?;
    let today = state.today();
    let from = today
        .checked_sub_days(Days::new(window_days(frequency) - 1))
        .unwrap_or(today);

    let overview = progress::overview(
        state.habits.as_ref(),
        state.entries.as_ref(),
        user_id,
        frequency,
        today,
    )
    .await?;

    let mut tables = Vec::with_capacity(overview.habits.len());
    for item in &overview.habits {
        let entries = state
            .entries
            .entries_between(item.habit.id, from, today)
            .await?;
        tables.push(EntryTable {
            habit: item.habit.clone(),
            entries,
        });
    }

    let page = PageData::load(&session, format!("{} entries", frequency.label())).await?;
    state.renderer.html(StatusCode::OK, |out| {
        views::entries_page(
            out,
            &page,
            frequency,
            &overview.progress,
            (from, today),
            &tables,
        )
    })
}

pub async fn progress_fragment(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(frequency): Path<String>,
) -> WebResult<Response> {
    let frequency = parse_frequency(&frequency)?;
    let overview = progress::overview(
        state.habits.as_ref(),
        state.entries.as_ref(),
        user_id,
        frequency,
        state.today(),
    )
    .await?;

    state.renderer.html(StatusCode::OK, |out| {
        views::progress_inner(out, &overview.progress)
    })
}
