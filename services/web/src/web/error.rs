//! services/web/src/web/error.rs
//!
//! Request-level failures and how they reach the browser. Internal failures
//! keep their detail for the log but always answer with a generic body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use habit_tracker_core::ports::PortError;

/// Convenient result alias for HTTP handlers.
pub type WebResult<T> = Result<T, AppError>;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Malformed body, path parameter or CSRF token.
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("authentication required")]
    Unauthorized,
    /// Missing, or owned by someone else. The two are never told apart.
    #[error("not found")]
    NotFound,
    #[error("internal error: {0}")]
    Internal(String),
}

/// Attached to 500 responses so the logging middleware can report the cause.
#[derive(Debug, Clone)]
pub struct ServerErrorDetail(pub String);

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<PortError> for AppError {
    fn from(err: PortError) -> Self {
        match err {
            PortError::NotFound(_) => AppError::NotFound,
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = status.canonical_reason().unwrap_or("Error");
        let mut response = (status, body).into_response();
        if let AppError::Internal(detail) = self {
            response.extensions_mut().insert(ServerErrorDetail(detail));
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(AppError::BadRequest("x".into()), StatusCode::BAD_REQUEST)]
    #[case(AppError::Unauthorized, StatusCode::UNAUTHORIZED)]
    #[case(AppError::NotFound, StatusCode::NOT_FOUND)]
    #[case(AppError::Internal("db down".into()), StatusCode::INTERNAL_SERVER_ERROR)]
    fn statuses(#[case] err: AppError, #[case] expected: StatusCode) {
        assert_eq!(err.into_response().status(), expected);
    }

    #[test]
    fn internal_detail_is_kept_off_the_body() {
        let response = AppError::Internal("connection refused".into()).into_response();
        let detail = response
            .extensions()
            .get::<ServerErrorDetail>()
            .expect("detail attached");
        assert_eq!(detail.0, "connection refused");
    }

    #[test]
    fn port_errors_map_by_kind() {
        assert!(matches!(
            AppError::from(PortError::NotFound("Habit 1".into())),
            AppError::NotFound
        ));
        assert!(matches!(
            AppError::from(PortError::Timeout(std::time::Duration::from_secs(3))),
            AppError::Internal(_)
        ));
    }
}
