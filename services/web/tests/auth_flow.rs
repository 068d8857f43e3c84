mod support;

use axum::http::StatusCode;
use rstest::rstest;
use support::{TestApp, PASSWORD};

#[tokio::test]
async fn home_page_is_public() {
    let app = TestApp::new();
    let mut client = app.client();

    let response = client.get("/").await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.body.contains(r#"href="/user/signup""#));
    assert!(client.csrf_token().is_some());
}

#[tokio::test]
async fn unknown_paths_are_not_found() {
    let app = TestApp::new();
    let response = app.client().get("/no/such/page").await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn pages_redirect_anonymous_visitors_to_login_with_a_notice() {
    let app = TestApp::new();
    let mut client = app.client();

    let response = client.get("/daily").await;
    assert_eq!(response.status, StatusCode::FOUND);
    assert_eq!(response.location(), Some("/user/login"));

    let login = client.get("/user/login").await;
    assert!(login
        .body
        .contains("You must be logged in to access this page."));
}

#[tokio::test]
async fn incremental_requests_without_a_session_are_unauthorized() {
    let app = TestApp::new();
    let response = app.client().get_htmx("/daily/progress").await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unsafe_requests_without_a_session_are_unauthorized() {
    let app = TestApp::new();
    let mut client = app.client();
    client.get("/").await;

    let response = client
        .post_form("/habits/entries/1", &[("status", "completed")])
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn signup_then_login_reaches_the_app_home() {
    let app = TestApp::new();
    let mut client = app.client();
    client.sign_in("Alice", "alice@example.com").await;

    let home = client.get("/apphome").await;
    assert_eq!(home.status, StatusCode::OK);
    assert!(home.body.contains("Welcome back, Alice"));
    assert_eq!(home.header("cache-control"), Some("no-store"));
}

#[tokio::test]
async fn signup_success_is_announced_once_on_the_login_page() {
    let app = TestApp::new();
    let mut client = app.client();
    client.get("/user/signup").await;

    let response = client
        .post_form(
            "/user/signup",
            &[
                ("name", "Bob"),
                ("email", "bob@example.com"),
                ("password", PASSWORD),
            ],
        )
        .await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), Some("/user/login"));

    let first = client.get("/user/login").await;
    assert!(first.body.contains("Your signup was successful! Please log in."));
    let second = client.get("/user/login").await;
    assert!(!second.body.contains("Your signup was successful!"));
}

#[tokio::test]
async fn duplicate_email_is_reported_on_the_email_field() {
    let app = TestApp::new();
    let mut first = app.client();
    first.sign_in("Alice", "a@example.com").await;

    let mut second = app.client();
    second.get("/user/signup").await;
    let writes_before = app.store.writes();
    let response = second
        .post_form(
            "/user/signup",
            &[
                ("name", "Another Alice"),
                ("email", "a@example.com"),
                ("password", PASSWORD),
            ],
        )
        .await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.body.contains("Email address is already registered"));
    assert!(response.body.contains(r#"value="Another Alice""#));
    assert!(!response.body.contains("users_email_key"));
    assert_eq!(app.store.writes(), writes_before);
}

#[rstest]
#[case::blank_name("", "c@example.com", PASSWORD, "must be provided")]
#[case::bad_email("Carol", "not-an-email", PASSWORD, "must be a valid email address")]
#[case::short_password("Carol", "c@example.com", "short", "Password must be at least 8 characters long")]
#[case::long_password("Carol", "c@example.com", "ppppppppppppppppppppppppppppppppppppppppppppppppppppppppppppppppppppppppp", "Password must not be more than 72 bytes")]
#[tokio::test]
async fn invalid_signups_are_unprocessable(
    #[case] name: &str,
    #[case] email: &str,
    #[case] password: &str,
    #[case] message: &str,
) {
    let app = TestApp::new();
    let mut client = app.client();
    client.get("/user/signup").await;

    let response = client
        .post_form(
            "/user/signup",
            &[("name", name), ("email", email), ("password", password)],
        )
        .await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.body.contains(message), "{}", response.body);
    assert!(!response.body.contains(&format!(r#"value="{password}""#)));
    assert_eq!(app.store.writes(), 0);
}

#[tokio::test]
async fn wrong_password_shows_a_generic_message() {
    let app = TestApp::new();
    let mut client = app.client();
    client.sign_in("Dana", "dana@example.com").await;
    client.get("/user/logout").await;

    client.get("/user/login").await;
    let response = client
        .post_form(
            "/user/login",
            &[("email", "dana@example.com"), ("password", "wrong-password")],
        )
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.body.contains("Invalid email or password"));
    assert!(response.body.contains(r#"value="dana@example.com""#));

    let home = client.get("/apphome").await;
    assert_eq!(home.status, StatusCode::FOUND);
}

#[tokio::test]
async fn unknown_email_looks_like_a_wrong_password() {
    let app = TestApp::new();
    let mut client = app.client();
    client.get("/user/login").await;

    let response = client
        .post_form(
            "/user/login",
            &[("email", "ghost@example.com"), ("password", PASSWORD)],
        )
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(response.body.contains("Invalid email or password"));
}

#[tokio::test]
async fn logout_ends_the_session() {
    let app = TestApp::new();
    let mut client = app.client();
    client.sign_in("Erin", "erin@example.com").await;

    let response = client.get("/user/logout").await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), Some("/user/login"));

    let login = client.get("/user/login").await;
    assert!(login.body.contains("You&#39;ve been logged out successfully!"));

    let home = client.get("/apphome").await;
    assert_eq!(home.status, StatusCode::FOUND);
}

#[tokio::test]
async fn forms_without_a_token_are_rejected() {
    let app = TestApp::new();
    let mut client = app.client();
    client.get("/user/login").await;

    let response = client
        .post_form_without_token(
            "/user/login",
            &[("email", "a@example.com"), ("password", PASSWORD)],
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn a_token_from_another_session_is_rejected() {
    let app = TestApp::new();
    let mut other = app.client();
    other.get("/").await;
    let foreign = other.csrf_token().expect("token issued").to_string();

    let mut client = app.client();
    client.get("/user/login").await;
    let response = client
        .post_form_without_token(
            "/user/login",
            &[
                ("email", "a@example.com"),
                ("password", PASSWORD),
                ("csrf_token", &foreign),
            ],
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}
