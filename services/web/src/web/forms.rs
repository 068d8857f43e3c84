//! services/web/src/web/forms.rs
//!
//! Form payloads and path parameter parsing. A body that cannot be decoded is
//! a client error (400), kept apart from field validation failures (422).

use axum::{
    extract::{FromRequest, Request},
    Form,
};
use habit_tracker_core::domain::{Frequency, HabitDraft};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::web::error::AppError;

/// `Form` with its rejection mapped to a 400.
pub struct ParsedForm<T>(pub T);

impl<S, T> FromRequest<S> for ParsedForm<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Form(value) = Form::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
        Ok(Self(value))
    }
}

// Missing fields decode as empty strings so the validator reports them.

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SignupForm {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct HabitForm {
    pub title: String,
    pub description: String,
    pub frequency: String,
    pub goal: String,
}

impl From<HabitForm> for HabitDraft {
    fn from(form: HabitForm) -> Self {
        HabitDraft {
            title: form.title,
            description: form.description,
            frequency: form.frequency,
            goal: form.goal,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct EntryForm {
    pub status: String,
    pub notes: String,
}

/// Positive numeric ids only; anything else is a malformed path.
pub fn parse_id(raw: &str) -> Result<i64, AppError> {
    match raw.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(AppError::BadRequest(format!("invalid id: {raw}"))),
    }
}

/// An unknown frequency names a page that does not exist.
pub fn parse_frequency(raw: &str) -> Result<Frequency, AppError> {
    raw.parse().map_err(|_| AppError::NotFound)
}
