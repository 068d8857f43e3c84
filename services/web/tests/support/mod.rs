//! Shared harness for the router tests: the full application over in-memory
//! adapters and an in-memory session store, driven like a browser that keeps
//! its session cookie and CSRF token between requests.

#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use habit_tracker_core::memory::{FakeCredentials, InMemoryStore};
use habit_tracker_core::ports::{HabitRepository, UserRepository};
use std::sync::Arc;
use tower::ServiceExt;
use tower_sessions::MemoryStore;
use web_lib::{
    config::Config,
    web::{
        build_app, error::ServerErrorDetail, render::Renderer, routes::SESSION_COOKIE_NAME,
        AppState,
    },
};

pub const PASSWORD: &str = "pa55word!";

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
    /// Cause attached to a 500 for the error log.
    pub server_error: Option<String>,
}

impl TestResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn location(&self) -> Option<&str> {
        self.header("location")
    }
}

/// One application instance. Clients made from it share its stores.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryStore>,
}

impl TestApp {
    pub fn new() -> Self {
        let store = Arc::new(InMemoryStore::new());
        Self::with_habits(store.clone(), store)
    }

    /// Serves habits from `habits`; users and entries stay in `store`.
    pub fn with_habits(store: Arc<InMemoryStore>, habits: Arc<dyn HabitRepository>) -> Self {
        let config = Config::from_lookup(|key| match key {
            "DATABASE_URL" => Some("postgres://localhost/unused".to_string()),
            "SESSION_SECURE_COOKIE" => Some("false".to_string()),
            _ => None,
        })
        .expect("test configuration is valid");

        let state = Arc::new(AppState {
            users: store.clone(),
            habits,
            entries: store.clone(),
            credentials: Arc::new(FakeCredentials),
            renderer: Renderer::new(),
            config: Arc::new(config),
        });
        let router = build_app(state, MemoryStore::default()).expect("router builds");

        Self { router, store }
    }

    pub fn client(&self) -> TestClient {
        TestClient {
            router: self.router.clone(),
            cookie: None,
            csrf_token: None,
        }
    }

    pub async fn user_id(&self, email: &str) -> i64 {
        self.store
            .get_user_by_email(email)
            .await
            .expect("user exists")
            .id
    }
}

pub struct TestClient {
    router: Router,
    cookie: Option<String>,
    csrf_token: Option<String>,
}

impl TestClient {
    pub fn csrf_token(&self) -> Option<&str> {
        self.csrf_token.as_deref()
    }

    pub async fn get(&mut self, path: &str) -> TestResponse {
        self.send(Method::GET, path, None, false, Vec::new()).await
    }

    pub async fn get_htmx(&mut self, path: &str) -> TestResponse {
        self.send(Method::GET, path, None, true, Vec::new()).await
    }

    /// Posts `fields` as a form, adding the session's CSRF token field.
    pub async fn post_form(&mut self, path: &str, fields: &[(&str, &str)]) -> TestResponse {
        let body = self.encode(fields, true);
        self.send(Method::POST, path, Some(body), false, Vec::new())
            .await
    }

    /// Posts like htmx does: `HX-Request` plus the token in a header.
    pub async fn post_htmx(&mut self, path: &str, fields: &[(&str, &str)]) -> TestResponse {
        let body = self.encode(fields, false);
        let extra = self
            .csrf_token
            .iter()
            .map(|token| ("x-csrf-token", token.clone()))
            .collect();
        self.send(Method::POST, path, Some(body), true, extra).await
    }

    /// Posts without any CSRF token.
    pub async fn post_form_without_token(
        &mut self,
        path: &str,
        fields: &[(&str, &str)],
    ) -> TestResponse {
        let body = self.encode(fields, false);
        self.send(Method::POST, path, Some(body), false, Vec::new())
            .await
    }

    fn encode(&self, fields: &[(&str, &str)], with_token: bool) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (key, value) in fields {
            serializer.append_pair(key, value);
        }
        if with_token {
            if let Some(token) = &self.csrf_token {
                serializer.append_pair("csrf_token", token);
            }
        }
        serializer.finish()
    }

    async fn send(
        &mut self,
        method: Method,
        path: &str,
        form: Option<String>,
        htmx: bool,
        extra: Vec<(&'static str, String)>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(cookie) = &self.cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        if htmx {
            builder = builder.header("hx-request", "true");
        }
        for (name, value) in extra {
            builder = builder.header(name, value);
        }
        let request = match form {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(body)),
            None => builder.body(Body::empty()),
        }
        .expect("request builds");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let headers = response.headers().clone();
        let server_error = response
            .extensions()
            .get::<ServerErrorDetail>()
            .map(|detail| detail.0.clone());
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body reads");
        let body = String::from_utf8(bytes.to_vec()).expect("utf-8 body");

        self.remember_cookie(&headers);
        if let Some(token) = extract_csrf_token(&body) {
            self.csrf_token = Some(token);
        }

        TestResponse {
            status,
            headers,
            body,
            server_error,
        }
    }

    fn remember_cookie(&mut self, headers: &HeaderMap) {
        let prefix = format!("{SESSION_COOKIE_NAME}=");
        for value in headers.get_all(header::SET_COOKIE) {
            let Ok(value) = value.to_str() else { continue };
            if let Some(pair) = value.split(';').next() {
                if pair.starts_with(&prefix) {
                    self.cookie = Some(pair.to_string());
                }
            }
        }
    }

    /// Signs up and logs in, leaving the client authenticated.
    pub async fn sign_in(&mut self, name: &str, email: &str) {
        self.get("/user/signup").await;
        let signup = self
            .post_form(
                "/user/signup",
                &[("name", name), ("email", email), ("password", PASSWORD)],
            )
            .await;
        assert_eq!(signup.status, StatusCode::SEE_OTHER, "{}", signup.body);

        self.get("/user/login").await;
        let login = self
            .post_form("/user/login", &[("email", email), ("password", PASSWORD)])
            .await;
        assert_eq!(login.status, StatusCode::SEE_OTHER, "{}", login.body);
        assert_eq!(login.location(), Some("/apphome"));
    }

    /// Submits the create-habit form with valid description and goal.
    pub async fn create_habit(&mut self, title: &str, frequency: &str) -> TestResponse {
        if self.csrf_token.is_none() {
            self.get("/daily").await;
        }
        self.post_form(
            "/habits/create",
            &[
                ("title", title),
                ("description", "Some description"),
                ("frequency", frequency),
                ("goal", "Every time"),
            ],
        )
        .await
    }
}

/// Reads the token from a form field, or from the page's `hx-headers` when
/// the page has no form.
fn extract_csrf_token(body: &str) -> Option<String> {
    [r#"name="csrf_token" value=""#, r#""x-csrf-token": ""#]
        .into_iter()
        .find_map(|marker| {
            let start = body.find(marker)? + marker.len();
            let end = body[start..].find('"')?;
            Some(body[start..start + end].to_string())
        })
}
