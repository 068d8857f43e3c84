//! services/web/src/web/middleware.rs
//!
//! Authentication gate and server-error logging.

use axum::{
    extract::Request,
    http::{header, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{error, info};

use crate::web::error::{AppError, ServerErrorDetail};
use crate::web::response::ResponseMode;
use crate::web::session::SessionContext;

pub const LOGIN_PATH: &str = "/user/login";

/// The authenticated caller, placed in request extensions by `require_auth`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser(pub i64);

/// Middleware that resolves the session's user before the handler runs.
///
/// Conventional page loads without a user are redirected to the login page
/// with a flash notice; any other unauthenticated request gets 401.
/// Authenticated responses are marked uncacheable.
pub async fn require_auth(
    session: SessionContext,
    mode: ResponseMode,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(user_id) = session.user_id().await? else {
        if req.method() == Method::GET && mode == ResponseMode::FullPage {
            info!(uri = %req.uri(), "Authentication required, redirecting to login");
            session
                .put_flash("You must be logged in to access this page.")
                .await?;
            return Ok((StatusCode::FOUND, [(header::LOCATION, LOGIN_PATH)]).into_response());
        }
        return Err(AppError::Unauthorized);
    };

    req.extensions_mut().insert(CurrentUser(user_id));

    let mut response = next.run(req).await;
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    Ok(response)
}

/// Logs internal failures with the request that caused them.
pub async fn log_server_errors(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();

    let response = next.run(req).await;
    if let Some(detail) = response.extensions().get::<ServerErrorDetail>() {
        error!(method = %method, uri = %uri, "{}", detail.0);
    }
    response
}
