//! services/web/src/web/routes.rs
//!
//! Assembles the router: public pages, the authenticated routes behind
//! `require_auth`, static assets, and the session, CSRF and logging layers.

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{services::ServeDir, trace::TraceLayer};
use tower_sessions::{
    cookie::{Key, SameSite},
    Expiry, SessionManagerLayer, SessionStore,
};

use crate::error::ApiError;
use crate::web::{
    auth, csrf, entries, error::AppError, habits,
    middleware::{log_server_errors, require_auth},
    pages,
    state::AppState,
};

pub const SESSION_COOKIE_NAME: &str = "habit_session";

/// Routes without any session, CSRF or logging layers.
pub fn routes(state: Arc<AppState>) -> Router {
    let public_routes: Router<Arc<AppState>> = Router::new()
        .route("/", get(pages::home))
        .route("/user/signup", get(auth::signup_form).post(auth::signup))
        .route("/user/login", get(auth::login_form).post(auth::login));

    let protected_routes: Router<Arc<AppState>> = Router::new()
        .route("/user/logout", get(auth::logout))
        .route("/apphome", get(pages::app_home))
        .route("/daily", get(habits::daily))
        .route("/weekly", get(habits::weekly))
        .route("/{frequency}/entries", get(entries::entries_page))
        .route("/{frequency}/progress", get(entries::progress_fragment))
        .route("/habits/create", post(habits::create))
        .route("/habits/edit/{frequency}/{id}", get(habits::edit_form))
        .route("/habits/update/{frequency}/{id}", post(habits::update))
        .route("/habits/delete/{frequency}/{id}", post(habits::delete))
        .route("/habits/entries/{id}", post(entries::log_entry))
        .route_layer(axum_middleware::from_fn(require_auth));

    let static_files = ServeDir::new(&state.config.static_dir);

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .nest_service("/static", static_files)
        .fallback(|| async { AppError::NotFound })
        .with_state(state)
}

/// The full application: routes wrapped in the CSRF check, the session layer
/// backed by `store`, server-error logging and request tracing.
pub fn build_app<Store>(state: Arc<AppState>, store: Store) -> Result<Router, ApiError>
where
    Store: SessionStore + Clone,
{
    let settings = &state.config.session;
    let key = match &settings.secret {
        Some(secret) => Key::try_from(secret.as_slice())
            .map_err(|e| ApiError::Internal(format!("unusable session secret: {e}")))?,
        None => Key::generate(),
    };
    let lifetime = time::Duration::try_from(settings.lifetime)
        .map_err(|e| ApiError::Internal(format!("unusable session lifetime: {e}")))?;

    let session_layer = SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_http_only(true)
        .with_secure(settings.secure_cookie)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(lifetime))
        .with_signed(key);

    Ok(routes(state)
        .layer(axum_middleware::from_fn(csrf::verify_csrf))
        .layer(session_layer)
        .layer(axum_middleware::from_fn(log_server_errors))
        .layer(TraceLayer::new_for_http()))
}
