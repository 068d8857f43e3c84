//! services/web/src/web/session.rs
//!
//! Session helpers to keep HTTP handlers free of framework-specific logic.
//!
//! Provides a thin wrapper around `tower_sessions::Session` so handlers only
//! deal with typed operations: the authenticated user id, a one-shot flash
//! message and the CSRF token.

use axum::{extract::FromRequestParts, http::request::Parts, http::StatusCode};
use tower_sessions::{session, Session};
use tracing::warn;
use uuid::Uuid;

use crate::web::error::AppError;

pub(crate) const USER_ID_KEY: &str = "authenticated_user_id";
pub(crate) const FLASH_KEY: &str = "flash";
pub(crate) const CSRF_KEY: &str = "csrf_token";

/// Newtype wrapper that exposes higher-level session operations.
#[derive(Clone, Debug)]
pub struct SessionContext(Session);

impl SessionContext {
    /// Construct a new wrapper from the underlying session.
    pub fn new(session: Session) -> Self {
        Self(session)
    }

    /// The authenticated user's id. A missing or wrong-typed value means the
    /// caller is not authenticated.
    pub async fn user_id(&self) -> Result<Option<i64>, AppError> {
        match self.0.get::<i64>(USER_ID_KEY).await {
            Ok(id) => Ok(id.filter(|id| *id > 0)),
            Err(session::Error::SerdeJson(error)) => {
                warn!("invalid user id in session: {error}");
                Ok(None)
            }
            Err(error) => Err(AppError::Internal(format!("failed to read session: {error}"))),
        }
    }

    /// Persist the authenticated user's id under a fresh session id.
    pub async fn persist_user(&self, user_id: i64) -> Result<(), AppError> {
        self.0.cycle_id().await.map_err(store_error)?;
        self.0.insert(USER_ID_KEY, user_id).await.map_err(store_error)
    }

    /// Drop the authenticated identity and move to a fresh session id.
    pub async fn forget_user(&self) -> Result<(), AppError> {
        self.0
            .remove::<serde_json::Value>(USER_ID_KEY)
            .await
            .map_err(store_error)?;
        self.0.cycle_id().await.map_err(store_error)
    }

    /// Stores a message to show once on the next rendered page.
    pub async fn put_flash(&self, message: impl Into<String>) -> Result<(), AppError> {
        self.0
            .insert(FLASH_KEY, message.into())
            .await
            .map_err(store_error)
    }

    /// Takes the pending flash message, if any.
    pub async fn pop_flash(&self) -> Result<Option<String>, AppError> {
        match self.0.remove::<String>(FLASH_KEY).await {
            Ok(flash) => Ok(flash),
            Err(session::Error::SerdeJson(_)) => Ok(None),
            Err(error) => Err(store_error(error)),
        }
    }

    /// The session's CSRF token, issuing one on first use.
    pub async fn csrf_token(&self) -> Result<String, AppError> {
        if let Some(token) = self.existing_csrf_token().await? {
            return Ok(token);
        }
        let token = Uuid::new_v4().simple().to_string();
        self.0
            .insert(CSRF_KEY, &token)
            .await
            .map_err(store_error)?;
        Ok(token)
    }

    /// The CSRF token issued earlier, without creating one.
    pub async fn existing_csrf_token(&self) -> Result<Option<String>, AppError> {
        match self.0.get::<String>(CSRF_KEY).await {
            Ok(token) => Ok(token),
            Err(session::Error::SerdeJson(_)) => Ok(None),
            Err(error) => Err(store_error(error)),
        }
    }
}

fn store_error(error: session::Error) -> AppError {
    AppError::Internal(format!("session store failure: {error}"))
}

impl<S> FromRequestParts<S> for SessionContext
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Session::from_request_parts(parts, state)
            .await
            .map(SessionContext::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tower_sessions::MemoryStore;

    fn session() -> SessionContext {
        let store = Arc::new(MemoryStore::default());
        SessionContext::new(Session::new(None, store, None))
    }

    #[tokio::test]
    async fn user_id_round_trips() {
        let ctx = session();
        assert_eq!(ctx.user_id().await.expect("read"), None);
        ctx.persist_user(7).await.expect("persist");
        assert_eq!(ctx.user_id().await.expect("read"), Some(7));
        ctx.forget_user().await.expect("forget");
        assert_eq!(ctx.user_id().await.expect("read"), None);
    }

    #[tokio::test]
    async fn wrong_typed_user_id_is_unauthenticated() {
        let ctx = session();
        ctx.0
            .insert(USER_ID_KEY, "not-a-number")
            .await
            .expect("insert");
        assert_eq!(ctx.user_id().await.expect("read"), None);
    }

    #[tokio::test]
    async fn flash_is_shown_once() {
        let ctx = session();
        ctx.put_flash("Saved").await.expect("put");
        assert_eq!(ctx.pop_flash().await.expect("pop").as_deref(), Some("Saved"));
        assert_eq!(ctx.pop_flash().await.expect("pop"), None);
    }

    #[tokio::test]
    async fn csrf_token_is_stable_within_a_session() {
        let ctx = session();
        assert_eq!(ctx.existing_csrf_token().await.expect("read"), None);
        let first = ctx.csrf_token().await.expect("issue");
        let second = ctx.csrf_token().await.expect("reuse");
        assert_eq!(first, second);
        assert_eq!(first.len(), 32);
    }
}
