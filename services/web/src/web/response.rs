//! services/web/src/web/response.rs
//!
//! Chooses the response shape once per request from the client's declared
//! capability: incremental-update clients send `HX-Request: true` and accept
//! fragments or a navigation instruction; everything else gets full pages and
//! `303` redirects.

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Redirect, Response},
};
use std::convert::Infallible;

pub const HX_REQUEST: &str = "hx-request";
pub const HX_LOCATION: &str = "hx-location";
pub const HX_TRIGGER: &str = "hx-trigger";

/// Event name that makes the progress widget re-fetch itself.
pub const REFRESH_PROGRESS_EVENT: &str = "refreshProgress";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseMode {
    /// A complete document, or a `303` after a mutation.
    FullPage,
    /// A snippet swapped into the live page.
    Fragment,
    /// An empty `200` telling the client where to navigate next.
    RedirectInstruction,
}

impl ResponseMode {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let incremental = headers
            .get(HX_REQUEST)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.eq_ignore_ascii_case("true"));
        if incremental {
            ResponseMode::Fragment
        } else {
            ResponseMode::FullPage
        }
    }

    pub fn is_incremental(self) -> bool {
        self != ResponseMode::FullPage
    }

    /// The shape to use once a mutation has nothing left to render.
    pub fn after_mutation(self) -> Self {
        match self {
            ResponseMode::FullPage => ResponseMode::FullPage,
            ResponseMode::Fragment | ResponseMode::RedirectInstruction => {
                ResponseMode::RedirectInstruction
            }
        }
    }

    /// Sends the client to `target`: a `303` for conventional clients, an
    /// `HX-Location` instruction for incremental ones.
    pub fn redirect(self, target: &str) -> Response {
        match self.after_mutation() {
            ResponseMode::FullPage => Redirect::to(target).into_response(),
            _ => {
                let mut response = StatusCode::OK.into_response();
                if let Ok(value) = HeaderValue::from_str(target) {
                    response.headers_mut().insert(HX_LOCATION, value);
                }
                response
            }
        }
    }
}

impl<S> FromRequestParts<S> for ResponseMode
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(ResponseMode::from_headers(&parts.headers))
    }
}

/// Adds an `HX-Trigger` event to a response.
pub fn with_trigger(mut response: Response, event: &'static str) -> Response {
    response
        .headers_mut()
        .insert(HX_TRIGGER, HeaderValue::from_static(event));
    response
}
