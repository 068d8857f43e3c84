//! services/web/src/web/auth.rs
//!
//! Signup, login and logout handlers.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    Extension,
};
use habit_tracker_core::{
    auth,
    domain::{validate_email, validate_password, validate_user},
    ports::PortError,
    validator::{self, FieldErrors, Validator},
};
use std::sync::Arc;
use tracing::info;

use crate::web::error::WebResult;
use crate::web::forms::{LoginForm, ParsedForm, SignupForm};
use crate::web::middleware::{CurrentUser, LOGIN_PATH};
use crate::web::render::PageData;
use crate::web::session::SessionContext;
use crate::web::state::AppState;
use crate::web::views;

const INVALID_CREDENTIALS: &str = "Invalid email or password";

//=========================================================================================
// Signup
//=========================================================================================

pub async fn signup_form(
    State(state): State<Arc<AppState>>,
    session: SessionContext,
) -> WebResult<Response> {
    render_signup(&state, &session, StatusCode::OK, "", "", &FieldErrors::new()).await
}

pub async fn signup(
    State(state): State<Arc<AppState>>,
    session: SessionContext,
    ParsedForm(form): ParsedForm<SignupForm>,
) -> WebResult<Response> {
    let mut v = Validator::new();
    validate_user(&mut v, &form.name, &form.email);
    validate_password(&mut v, &form.password);
    if !v.is_valid() {
        return render_signup(
            &state,
            &session,
            StatusCode::UNPROCESSABLE_ENTITY,
            &form.name,
            &form.email,
            v.errors(),
        )
        .await;
    }

    match auth::register(
        state.users.as_ref(),
        state.credentials.as_ref(),
        &form.name,
        &form.email,
        &form.password,
    )
    .await
    {
        Ok(user) => info!(user_id = user.id, "User signed up"),
        Err(PortError::DuplicateEmail) => {
            info!("Signup rejected: email already registered");
            v.add_error("email", "Email address is already registered");
            return render_signup(
                &state,
                &session,
                StatusCode::UNPROCESSABLE_ENTITY,
                &form.name,
                &form.email,
                v.errors(),
            )
            .await;
        }
        Err(e) => return Err(e.into()),
    }

    session
        .put_flash("Your signup was successful! Please log in.")
        .await?;
    Ok(Redirect::to(LOGIN_PATH).into_response())
}

async fn render_signup(
    state: &AppState,
    session: &SessionContext,
    status: StatusCode,
    name: &str,
    email: &str,
    errors: &FieldErrors,
) -> WebResult<Response> {
    let page = PageData::load(session, "Signup").await?;
    state
        .renderer
        .html(status, |out| views::signup_page(out, &page, name, email, errors))
}

//=========================================================================================
// Login & Logout
//=========================================================================================

pub async fn login_form(
    State(state): State<Arc<AppState>>,
    session: SessionContext,
) -> WebResult<Response> {
    render_login(&state, &session, StatusCode::OK, "", &FieldErrors::new(), None).await
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    session: SessionContext,
    ParsedForm(form): ParsedForm<LoginForm>,
) -> WebResult<Response> {
    let mut v = Validator::new();
    validate_email(&mut v, &form.email);
    v.check(
        validator::not_blank(&form.password),
        "password",
        "must be provided",
    );
    if !v.is_valid() {
        return render_login(
            &state,
            &session,
            StatusCode::UNPROCESSABLE_ENTITY,
            &form.email,
            v.errors(),
            None,
        )
        .await;
    }

    let user_id = match auth::authenticate(
        state.users.as_ref(),
        state.credentials.as_ref(),
        &form.email,
        &form.password,
    )
    .await
    {
        Ok(id) => id,
        Err(PortError::InvalidCredentials) => {
            info!("Login rejected: invalid credentials");
            return render_login(
                &state,
                &session,
                StatusCode::UNPROCESSABLE_ENTITY,
                &form.email,
                v.errors(),
                Some(INVALID_CREDENTIALS),
            )
            .await;
        }
        Err(e) => return Err(e.into()),
    };

    session.persist_user(user_id).await?;
    info!(user_id, "User logged in");
    Ok(Redirect::to("/apphome").into_response())
}

async fn render_login(
    state: &AppState,
    session: &SessionContext,
    status: StatusCode,
    email: &str,
    errors: &FieldErrors,
    failure: Option<&str>,
) -> WebResult<Response> {
    let page = PageData::load(session, "Login").await?;
    state
        .renderer
        .html(status, |out| views::login_page(out, &page, email, errors, failure))
}

pub async fn logout(
    session: SessionContext,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
) -> WebResult<Response> {
    session.forget_user().await?;
    session.put_flash("You've been logged out successfully!").await?;
    info!(user_id, "User logged out");
    Ok(Redirect::to(LOGIN_PATH).into_response())
}
