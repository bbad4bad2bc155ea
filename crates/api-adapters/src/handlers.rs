//! Route handlers for the Clubhouse API.
//!
//! Every handler follows the same shape: resolve the session cookie into
//! an optional principal, hand it to a service, and let the service's
//! policy check decide. Handlers never make authorization decisions
//! themselves.

use axum::extract::{Path, State};
use axum::http::header::{HeaderMap, SET_COOKIE};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use domains::models::{
    InsertAnnouncement, InsertEvent, InsertPage, InsertPkBattle, InsertUser, UpdatePage,
    UpdateUser, User,
};

use crate::error::ApiResult;
use crate::middleware;
use crate::session::{self, Session};
use crate::AppState;

/// Builds the full API router with tracing and CORS applied.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/login", post(login))
        .route("/api/logout", post(logout))
        .route("/api/user", get(current_user))
        .route("/api/users", get(list_users).post(create_user))
        .route("/api/users/{id}", patch(update_user).delete(delete_user))
        .route("/api/messages", get(list_messages).post(create_message))
        .route("/api/messages/{id}", axum::routing::delete(delete_message))
        .route("/api/pages", get(list_pages).post(create_page))
        .route("/api/pages/{id}", patch(update_page).delete(delete_page))
        .route("/api/events", get(list_events).post(create_event))
        .route("/api/events/{id}/like", post(like_event))
        .route("/api/pk-battles", get(list_battles).post(create_battle))
        .route(
            "/api/announcements",
            get(list_announcements).post(create_announcement),
        )
        .route("/api/settings", post(set_setting))
        .route("/api/settings/{key}", get(get_setting))
        .layer(middleware::trace_policy())
        .layer(middleware::cors_policy())
        .with_state(state)
}

// ── Auth ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct LoginRequest {
    username: String,
    password: String,
}

async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<impl IntoResponse> {
    let (user, token) = state.auth.login(&payload.username, &payload.password).await?;
    info!(user_id = user.id, "login");
    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, session::login_cookie(&token, state.cookies)?);
    Ok((headers, Json(user)))
}

/// Logout is idempotent: an anonymous call still clears the cookie.
async fn logout(
    State(state): State<AppState>,
    request_headers: HeaderMap,
) -> ApiResult<impl IntoResponse> {
    if let Some(token) = session::token_from_headers(&request_headers) {
        state.auth.logout(&token).await?;
    }
    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, session::logout_cookie());
    Ok((headers, Json(json!({ "message": "logged out" }))))
}

/// Who am I: `null` for anonymous callers, never an error.
async fn current_user(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> ApiResult<Json<Option<User>>> {
    let token = session::token_from_headers(&headers);
    Ok(Json(state.auth.current_user(token.as_deref()).await?))
}

// ── Users ────────────────────────────────────────────────────────────────────

async fn list_users(
    State(state): State<AppState>,
    Session(principal): Session,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.users.list(principal.as_ref()).await?))
}

async fn create_user(
    State(state): State<AppState>,
    Session(principal): Session,
    Json(input): Json<InsertUser>,
) -> ApiResult<impl IntoResponse> {
    let user = state.users.create(principal.as_ref(), input).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn update_user(
    State(state): State<AppState>,
    Session(principal): Session,
    Path(id): Path<i32>,
    Json(patch): Json<UpdateUser>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.users.update(principal.as_ref(), id, patch).await?))
}

async fn delete_user(
    State(state): State<AppState>,
    Session(principal): Session,
    Path(id): Path<i32>,
) -> ApiResult<StatusCode> {
    state.users.delete(principal.as_ref(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── Chat ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateMessageRequest {
    content: String,
    reply_to_id: Option<i32>,
}

async fn list_messages(
    State(state): State<AppState>,
    Session(principal): Session,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.chat.list(principal.as_ref()).await?))
}

async fn create_message(
    State(state): State<AppState>,
    Session(principal): Session,
    Json(payload): Json<CreateMessageRequest>,
) -> ApiResult<impl IntoResponse> {
    let message = state
        .chat
        .create(principal.as_ref(), &payload.content, payload.reply_to_id)
        .await?;
    Ok((StatusCode::CREATED, Json(message)))
}

async fn delete_message(
    State(state): State<AppState>,
    Session(principal): Session,
    Path(id): Path<i32>,
) -> ApiResult<StatusCode> {
    state.chat.delete(principal.as_ref(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── Pages ────────────────────────────────────────────────────────────────────

async fn list_pages(
    State(state): State<AppState>,
    Session(principal): Session,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.pages.list(principal.as_ref()).await?))
}

async fn create_page(
    State(state): State<AppState>,
    Session(principal): Session,
    Json(input): Json<InsertPage>,
) -> ApiResult<impl IntoResponse> {
    let page = state.pages.create(principal.as_ref(), input).await?;
    Ok((StatusCode::CREATED, Json(page)))
}

async fn update_page(
    State(state): State<AppState>,
    Session(principal): Session,
    Path(id): Path<i32>,
    Json(patch): Json<UpdatePage>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.pages.update(principal.as_ref(), id, patch).await?))
}

async fn delete_page(
    State(state): State<AppState>,
    Session(principal): Session,
    Path(id): Path<i32>,
) -> ApiResult<StatusCode> {
    state.pages.delete(principal.as_ref(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ── Events ───────────────────────────────────────────────────────────────────

async fn list_events(
    State(state): State<AppState>,
    Session(principal): Session,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.events.list(principal.as_ref()).await?))
}

async fn create_event(
    State(state): State<AppState>,
    Session(principal): Session,
    Json(input): Json<InsertEvent>,
) -> ApiResult<impl IntoResponse> {
    let event = state.events.create(principal.as_ref(), input).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

/// Idempotent: liking twice returns the unchanged event with 200.
async fn like_event(
    State(state): State<AppState>,
    Session(principal): Session,
    Path(id): Path<i32>,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.events.like(principal.as_ref(), id).await?))
}

// ── PK battles ───────────────────────────────────────────────────────────────

async fn list_battles(
    State(state): State<AppState>,
    Session(principal): Session,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.battles.list(principal.as_ref()).await?))
}

async fn create_battle(
    State(state): State<AppState>,
    Session(principal): Session,
    Json(input): Json<InsertPkBattle>,
) -> ApiResult<impl IntoResponse> {
    let battle = state.battles.create(principal.as_ref(), input).await?;
    Ok((StatusCode::CREATED, Json(battle)))
}

// ── Announcements ────────────────────────────────────────────────────────────

async fn list_announcements(
    State(state): State<AppState>,
    Session(principal): Session,
) -> ApiResult<impl IntoResponse> {
    Ok(Json(state.announcements.list_active(principal.as_ref()).await?))
}

async fn create_announcement(
    State(state): State<AppState>,
    Session(principal): Session,
    Json(input): Json<InsertAnnouncement>,
) -> ApiResult<impl IntoResponse> {
    let announcement = state
        .announcements
        .create(principal.as_ref(), input)
        .await?;
    Ok((StatusCode::CREATED, Json(announcement)))
}

// ── Settings ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct SetSettingRequest {
    key: String,
    value: String,
}

/// The one anonymous read: clients fetch display settings before login.
async fn get_setting(
    State(state): State<AppState>,
    Session(principal): Session,
    Path(key): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let setting = state.settings.get(principal.as_ref(), &key).await?;
    Ok(Json(json!({ "value": setting.value })))
}

async fn set_setting(
    State(state): State<AppState>,
    Session(principal): Session,
    Json(payload): Json<SetSettingRequest>,
) -> ApiResult<impl IntoResponse> {
    let setting = state
        .settings
        .set(principal.as_ref(), &payload.key, &payload.value)
        .await?;
    Ok(Json(setting))
}
