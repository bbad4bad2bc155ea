//! Smoke tests for route wiring: the full suite lives in the
//! integration-tests crate, this one only proves the router, the session
//! cookie round trip, and the error mapping hang together.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use chrono::Duration;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use api_adapters::{AppState, CookiePolicy, Ports};
use auth_adapters::{Argon2Verifier, MemorySessionStore};
use storage_adapters::MemoryStore;

async fn app() -> Router {
    let store = Arc::new(MemoryStore::new());
    let state = AppState::new(
        Ports {
            users: store.clone(),
            messages: store.clone(),
            pages: store.clone(),
            events: store.clone(),
            battles: store.clone(),
            announcements: store.clone(),
            settings: store,
            verifier: Arc::new(Argon2Verifier),
            sessions: Arc::new(MemorySessionStore::new(Duration::hours(1))),
        },
        CookiePolicy::default(),
    );
    state
        .users
        .seed_admin_if_empty("admin123")
        .await
        .expect("seed admin");
    api_adapters::router(state)
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

async fn body_json(body: Body) -> Value {
    let bytes = to_bytes(body, usize::MAX).await.expect("read body");
    serde_json::from_slice(&bytes).expect("json body")
}

/// Logs in and returns the session cookie pair for follow-up requests.
async fn login(app: &Router, username: &str, password: &str) -> String {
    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/login",
            json!({ "username": username, "password": password }),
        ))
        .await
        .expect("login response");
    assert_eq!(response.status(), StatusCode::OK);
    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("session cookie")
        .to_str()
        .expect("cookie str");
    set_cookie
        .split(';')
        .next()
        .expect("cookie pair")
        .to_string()
}

#[tokio::test]
async fn login_sets_cookie_and_current_user_sees_it() {
    let app = app().await;
    let cookie = login(&app, "admin", "admin123").await;

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/user")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let user = body_json(response.into_body()).await;
    assert_eq!(user["username"], "admin");
    assert_eq!(user["role"], "admin");
    assert!(user.get("passwordHash").is_none());
    assert!(user.get("password_hash").is_none());
}

#[tokio::test]
async fn anonymous_current_user_is_null_not_an_error() {
    let app = app().await;
    let response = app
        .oneshot(Request::builder().uri("/api/user").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response.into_body()).await, Value::Null);
}

#[tokio::test]
async fn bad_credentials_are_unauthorized() {
    let app = app().await;
    let response = app
        .oneshot(json_request(
            "POST",
            "/api/login",
            json!({ "username": "admin", "password": "wrong" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn anonymous_reads_are_unauthorized() {
    let app = app().await;
    for uri in ["/api/messages", "/api/users", "/api/events"] {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
    }
}

#[tokio::test]
async fn message_round_trip_and_created_status() {
    let app = app().await;
    let cookie = login(&app, "admin", "admin123").await;

    let response = app
        .clone()
        .oneshot(
            json_request("POST", "/api/messages", json!({ "content": "hello" }))
                .tap_cookie(&cookie),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/messages")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let messages = body_json(response.into_body()).await;
    assert_eq!(messages[0]["content"], "hello");
    assert_eq!(messages[0]["author"]["username"], "admin");
}

#[tokio::test]
async fn logout_invalidates_the_session() {
    let app = app().await;
    let cookie = login(&app, "admin", "admin123").await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/logout")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/messages")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

/// Adds the session cookie to an already-built request.
trait TapCookie {
    fn tap_cookie(self, cookie: &str) -> Self;
}

impl TapCookie for Request<Body> {
    fn tap_cookie(mut self, cookie: &str) -> Self {
        let value = cookie.parse().expect("cookie value");
        self.headers_mut().insert(header::COOKIE, value);
        self
    }
}
