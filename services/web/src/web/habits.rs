//! services/web/src/web/habits.rs
//!
//! Habit listing and the create, edit, update and delete handlers.
//!
//! Every handler that addresses a habit by id goes through `owned_habit`, so a
//! habit belonging to someone else is indistinguishable from one that does
//! not exist.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Response,
    Extension,
};
use habit_tracker_core::{
    domain::{Frequency, Habit, HabitDraft},
    progress,
    validator::{FieldErrors, Validator},
};
use std::sync::Arc;
use tracing::{debug, info};

use crate::web::error::{AppError, WebResult};
use crate::web::forms::{parse_frequency, parse_id, HabitForm, ParsedForm};
use crate::web::middleware::CurrentUser;
use crate::web::render::PageData;
use crate::web::response::ResponseMode;
use crate::web::session::SessionContext;
use crate::web::state::AppState;
use crate::web::views::{self, HabitFormView};

const CREATE_PATH: &str = "/habits/create";

//=========================================================================================
// Ownership
//=========================================================================================

/// Loads habit `id` on behalf of `user_id`. Missing and foreign habits both
/// come back as `NotFound`.
pub(crate) async fn owned_habit(state: &AppState, id: i64, user_id: i64) -> WebResult<Habit> {
    let habit = state.habits.get_habit(id).await?;
    if habit.user_id != user_id {
        debug!(habit_id = id, user_id, "Habit requested by a non-owner");
        return Err(AppError::NotFound);
    }
    Ok(habit)
}

//=========================================================================================
// Listing
//=========================================================================================

pub async fn daily(
    state: State<Arc<AppState>>,
    session: SessionContext,
    user: Extension<CurrentUser>,
) -> WebResult<Response> {
    habits_page(state, session, user, Frequency::Daily).await
}

pub async fn weekly(
    state: State<Arc<AppState>>,
    session: SessionContext,
    user: Extension<CurrentUser>,
) -> WebResult<Response> {
    habits_page(state, session, user, Frequency::Weekly).await
}

async fn habits_page(
    State(state): State<Arc<AppState>>,
    session: SessionContext,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    frequency: Frequency,
) -> WebResult<Response> {
    let draft = HabitDraft {
        frequency: frequency.as_str().to_string(),
        ..HabitDraft::default()
    };
    render_habits_page(
        &state,
        &session,
        user_id,
        frequency,
        StatusCode::OK,
        &draft,
        &FieldErrors::new(),
    )
    .await
}

async fn render_habits_page(
    state: &AppState,
    session: &SessionContext,
    user_id: i64,
    frequency: Frequency,
    status: StatusCode,
    draft: &HabitDraft,
    errors: &FieldErrors,
) -> WebResult<Response> {
    let overview = progress::overview(
        state.habits.as_ref(),
        state.entries.as_ref(),
        user_id,
        frequency,
        state.today(),
    )
    .await?;

    let page = PageData::load(session, format!("{} habits", frequency.label())).await?;
    let form = HabitFormView {
        action: CREATE_PATH.to_string(),
        submit: "Create habit",
        draft,
        errors,
    };
    state.renderer.html(status, |out| {
        views::habits_page(out, &page, frequency, &overview, &form)
    })
}

//=========================================================================================
// Create
//=========================================================================================

pub async fn create(
    State(state): State<Arc<AppState>>,
    session: SessionContext,
    mode: ResponseMode,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    ParsedForm(form): ParsedForm<HabitForm>,
) -> WebResult<Response> {
    let draft = HabitDraft::from(form);
    let mut v = Validator::new();
    let Some(valid) = draft.validate(&mut v) else {
        debug!(errors = ?v.errors(), "Habit rejected by validation");
        if mode.is_incremental() {
            let form = HabitFormView {
                action: CREATE_PATH.to_string(),
                submit: "Create habit",
                draft: &draft,
                errors: v.errors(),
            };
            let token = session.csrf_token().await?;
            return state.renderer.html(StatusCode::UNPROCESSABLE_ENTITY, |out| {
                views::habit_form(out, &token, &form)
            });
        }
        let frequency = draft.frequency.parse().unwrap_or(Frequency::Daily);
        return render_habits_page(
            &state,
            &session,
            user_id,
            frequency,
            StatusCode::UNPROCESSABLE_ENTITY,
            &draft,
            v.errors(),
        )
        .await;
    };

    let habit = state.habits.insert_habit(valid.into_new(user_id)).await?;
    info!(habit_id = habit.id, user_id, "Habit created");

    session.put_flash("Habit created successfully!").await?;
    Ok(mode.redirect(&habit.frequency.page_path()))
}

//=========================================================================================
// Edit & Update
//=========================================================================================

fn update_path(frequency: Frequency, id: i64) -> String {
    format!("/habits/update/{}/{}", frequency.as_str(), id)
}

pub async fn edit_form(
    State(state): State<Arc<AppState>>,
    session: SessionContext,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path((frequency, id)): Path<(String, String)>,
) -> WebResult<Response> {
    let frequency = parse_frequency(&frequency)?;
    let id = parse_id(&id)?;
    let habit = owned_habit(&state, id, user_id).await?;

    let draft = HabitDraft {
        title: habit.title,
        description: habit.description,
        frequency: habit.frequency.as_str().to_string(),
        goal: habit.goal,
    };
    render_edit_page(
        &state,
        &session,
        frequency,
        id,
        StatusCode::OK,
        &draft,
        &FieldErrors::new(),
    )
    .await
}

async fn render_edit_page(
    state: &AppState,
    session: &SessionContext,
    frequency: Frequency,
    id: i64,
    status: StatusCode,
    draft: &HabitDraft,
    errors: &FieldErrors,
) -> WebResult<Response> {
    let page = PageData::load(session, "Edit habit").await?;
    let form = HabitFormView {
        action: update_path(frequency, id),
        submit: "Save changes",
        draft,
        errors,
    };
    state
        .renderer
        .html(status, |out| views::edit_page(out, &page, &form))
}

pub async fn update(
    State(state): State<Arc<AppState>>,
    session: SessionContext,
    mode: ResponseMode,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path((frequency, id)): Path<(String, String)>,
    ParsedForm(form): ParsedForm<HabitForm>,
) -> WebResult<Response> {
    let frequency = parse_frequency(&frequency)?;
    let id = parse_id(&id)?;

    let draft = HabitDraft::from(form);
    let mut v = Validator::new();
    let Some(valid) = draft.validate(&mut v) else {
        debug!(habit_id = id, errors = ?v.errors(), "Habit update rejected by validation");
        if mode.is_incremental() {
            let form = HabitFormView {
                action: update_path(frequency, id),
                submit: "Save changes",
                draft: &draft,
                errors: v.errors(),
            };
            let token = session.csrf_token().await?;
            return state.renderer.html(StatusCode::UNPROCESSABLE_ENTITY, |out| {
                views::habit_form(out, &token, &form)
            });
        }
        return render_edit_page(
            &state,
            &session,
            frequency,
            id,
            StatusCode::UNPROCESSABLE_ENTITY,
            &draft,
            v.errors(),
        )
        .await;
    };

    let mut habit = owned_habit(&state, id, user_id).await?;
    valid.apply_to(&mut habit);
    let saved = state.habits.update_habit(&habit).await?;
    info!(habit_id = saved.id, user_id, "Habit updated");

    session.put_flash("Habit updated successfully!").await?;
    Ok(mode.redirect(&saved.frequency.page_path()))
}

//=========================================================================================
// Delete
//=========================================================================================

pub async fn delete(
    State(state): State<Arc<AppState>>,
    session: SessionContext,
    mode: ResponseMode,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path((frequency, id)): Path<(String, String)>,
) -> WebResult<Response> {
    parse_frequency(&frequency)?;
    let id = parse_id(&id)?;

    let habit = owned_habit(&state, id, user_id).await?;
    state.habits.delete_habit(habit.id, user_id).await?;
    info!(habit_id = id, user_id, "Habit deleted");

    session.put_flash("Habit deleted successfully!").await?;
    Ok(mode.redirect(&habit.frequency.page_path()))
}
