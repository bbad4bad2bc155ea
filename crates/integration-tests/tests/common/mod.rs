//! Shared harness: a fully wired server on the in-memory store, with a
//! seeded admin plus one moderator and one regular user.

// Not every suite uses every helper.
#![allow(dead_code)]

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use chrono::Duration;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use api_adapters::{AppState, CookiePolicy, Ports};
use auth_adapters::{Argon2Verifier, MemorySessionStore};
use domains::models::{InsertUser, Role};
use storage_adapters::MemoryStore;

pub const ADMIN: (&str, &str) = ("admin", "admin123");
pub const MODERATOR: (&str, &str) = ("mona", "modpass1");
pub const USER: (&str, &str) = ("carol", "userpass1");

fn account(username: &str, password: &str, role: Role) -> InsertUser {
    InsertUser {
        username: username.to_string(),
        password: password.to_string(),
        role,
        display_name: None,
        tag: None,
        tag_color: None,
        avatar_url: None,
        is_employee_of_month: false,
    }
}

/// Builds the router with the three standard accounts in place.
pub async fn app() -> Router {
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

    let admin = state
        .users
        .seed_admin_if_empty(ADMIN.1)
        .await
        .expect("seed admin")
        .expect("fresh store seeds an admin");
    let as_admin = admin.principal();
    state
        .users
        .create(
            Some(&as_admin),
            account(MODERATOR.0, MODERATOR.1, Role::Moderator),
        )
        .await
        .expect("create moderator");
    state
        .users
        .create(Some(&as_admin), account(USER.0, USER.1, Role::User))
        .await
        .expect("create user");

    api_adapters::router(state)
}

/// Logs in and returns the `name=value` cookie pair.
pub async fn login(app: &Router, credentials: (&str, &str)) -> String {
    let response = send(
        app,
        post_json(
            "/api/login",
            serde_json::json!({ "username": credentials.0, "password": credentials.1 }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK, "login {}", credentials.0);
    response
        .headers()
        .get(header::SET_COOKIE)
        .expect("session cookie")
        .to_str()
        .expect("cookie str")
        .split(';')
        .next()
        .expect("cookie pair")
        .to_string()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).expect("request")
}

pub fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

pub fn patch_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("PATCH")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

pub fn delete(uri: &str) -> Request<Body> {
    Request::builder()
        .method("DELETE")
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

/// Attaches a session cookie to a request.
pub fn with_cookie(mut request: Request<Body>, cookie: &str) -> Request<Body> {
    let value = cookie.parse().expect("cookie value");
    request.headers_mut().insert(header::COOKIE, value);
    request
}

pub async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.expect("response")
}

pub async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json body")
}
