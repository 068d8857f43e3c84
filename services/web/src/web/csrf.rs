//! services/web/src/web/csrf.rs
//!
//! Synchronizer-token CSRF check. Every state-changing request must echo the
//! token stored in its session, either in the `X-CSRF-Token` header or in the
//! `csrf_token` form field. Mismatches never reach a handler.

use axum::{
    body::{to_bytes, Body},
    extract::Request,
    http::Method,
    middleware::Next,
    response::Response,
};
use tower_sessions::Session;
use tracing::info;

use crate::web::error::AppError;
use crate::web::session::SessionContext;

pub const CSRF_HEADER: &str = "x-csrf-token";
pub const CSRF_FIELD: &str = "csrf_token";

/// Largest form body buffered for the token lookup.
const MAX_FORM_BYTES: usize = 64 * 1024;

fn is_safe(method: &Method) -> bool {
    matches!(
        *method,
        Method::GET | Method::HEAD | Method::OPTIONS | Method::TRACE
    )
}

/// Compares without short-circuiting on the first differing byte.
pub fn tokens_match(expected: &str, presented: &str) -> bool {
    let (a, b) = (expected.as_bytes(), presented.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

fn form_field(body: &[u8], name: &str) -> Option<String> {
    url::form_urlencoded::parse(body)
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

pub async fn verify_csrf(req: Request, next: Next) -> Result<Response, AppError> {
    if is_safe(req.method()) {
        return Ok(next.run(req).await);
    }

    let session = req
        .extensions()
        .get::<Session>()
        .cloned()
        .map(SessionContext::new)
        .ok_or_else(|| AppError::Internal("session layer is not installed".to_string()))?;
    let expected = session.existing_csrf_token().await?;

    let (parts, body) = req.into_parts();
    let bytes = to_bytes(body, MAX_FORM_BYTES)
        .await
        .map_err(|e| AppError::BadRequest(format!("unreadable body: {e}")))?;

    let presented = parts
        .headers
        .get(CSRF_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
        .or_else(|| form_field(&bytes, CSRF_FIELD));

    match (expected, presented) {
        (Some(expected), Some(presented)) if tokens_match(&expected, &presented) => {}
        _ => {
            info!(method = %parts.method, uri = %parts.uri, "CSRF token missing or mismatched");
            return Err(AppError::BadRequest("CSRF token mismatch".to_string()));
        }
    }

    Ok(next.run(Request::from_parts(parts, Body::from(bytes))).await)
}
