//! services/web/src/web/pages.rs
//!
//! Landing page and the authenticated home.

use axum::{
    extract::State,
    http::StatusCode,
    response::Response,
    Extension,
};
use habit_tracker_core::{domain::Frequency, progress};
use std::sync::Arc;

use crate::web::error::WebResult;
use crate::web::middleware::CurrentUser;
use crate::web::render::PageData;
use crate::web::session::SessionContext;
use crate::web::state::AppState;
use crate::web::views;

pub async fn home(State(state): State<Arc<AppState>>, session: SessionContext) -> WebResult<Response> {
    let page = PageData::load(&session, "Home").await?;
    state
        .renderer
        .html(StatusCode::OK, |out| views::home_page(out, &page))
}

pub async fn app_home(
    State(state): State<Arc<AppState>>,
    session: SessionContext,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
) -> WebResult<Response> {
    let user = state.users.get_user_by_id(user_id).await?;
    let today = state.today();

    let mut summaries = Vec::with_capacity(Frequency::ALL.len());
    for frequency in Frequency::ALL {
        let overview = progress::overview(
            state.habits.as_ref(),
            state.entries.as_ref(),
            user_id,
            frequency,
            today,
        )
        .await?;
        summaries.push((frequency, overview.progress));
    }

    let page = PageData::load(&session, "Home").await?;
    state.renderer.html(StatusCode::OK, |out| {
        views::app_home_page(out, &page, &user.name, &summaries)
    })
}
