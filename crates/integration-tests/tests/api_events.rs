//! Events and the idempotent like.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::*;

async fn create_event_on(app: &axum::Router, cookie: &str, title: &str, date: &str) -> i64 {
    let response = send(
        app,
        with_cookie(
            post_json(
                "/api/events",
                json!({
                    "title": title,
                    "description": "community night",
                    "date": date
                }),
            ),
            cookie,
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["id"].as_i64().expect("id")
}

async fn create_event(app: &axum::Router, cookie: &str, title: &str) -> i64 {
    create_event_on(app, cookie, title, "2026-09-12T19:00:00Z").await
}

#[tokio::test]
async fn admin_creates_and_everyone_reads() {
    let app = app().await;
    let admin_cookie = login(&app, ADMIN).await;
    create_event(&app, &admin_cookie, "Game night").await;

    let cookie = login(&app, USER).await;
    let events = body_json(send(&app, with_cookie(get("/api/events"), &cookie)).await).await;
    assert_eq!(events[0]["title"], "Game night");
    assert_eq!(events[0]["likes"], 0);
    assert_eq!(events[0]["likedBy"], json!([]));
}

#[tokio::test]
async fn events_come_back_latest_date_first() {
    let app = app().await;
    let admin_cookie = login(&app, ADMIN).await;
    // Created earliest-date first, so insertion order cannot mask the sort.
    create_event_on(&app, &admin_cookie, "Spring fair", "2026-04-01T12:00:00Z").await;
    create_event_on(&app, &admin_cookie, "New year bash", "2026-12-31T22:00:00Z").await;
    create_event_on(&app, &admin_cookie, "Summer jam", "2026-07-15T18:00:00Z").await;

    let cookie = login(&app, USER).await;
    let events = body_json(send(&app, with_cookie(get("/api/events"), &cookie)).await).await;
    let titles: Vec<&str> = events
        .as_array()
        .expect("array")
        .iter()
        .map(|e| e["title"].as_str().expect("title"))
        .collect();
    assert_eq!(titles, vec!["New year bash", "Summer jam", "Spring fair"]);
}

#[tokio::test]
async fn only_admins_create_events() {
    let app = app().await;
    for credentials in [MODERATOR, USER] {
        let cookie = login(&app, credentials).await;
        let response = send(
            &app,
            with_cookie(
                post_json(
                    "/api/events",
                    json!({
                        "title": "Rogue event",
                        "description": "nope",
                        "date": "2026-09-12T19:00:00Z"
                    }),
                ),
                &cookie,
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "{}", credentials.0);
    }
}

#[tokio::test]
async fn liking_twice_counts_once() {
    let app = app().await;
    let admin_cookie = login(&app, ADMIN).await;
    let id = create_event(&app, &admin_cookie, "Movie night").await;

    let cookie = login(&app, USER).await;
    let uri = format!("/api/events/{id}/like");

    let first = send(&app, with_cookie(post_json(&uri, json!({})), &cookie)).await;
    assert_eq!(first.status(), StatusCode::OK);
    let event = body_json(first).await;
    assert_eq!(event["likes"], 1);

    let second = send(&app, with_cookie(post_json(&uri, json!({})), &cookie)).await;
    assert_eq!(second.status(), StatusCode::OK);
    let event = body_json(second).await;
    assert_eq!(event["likes"], 1);
    assert_eq!(event["likedBy"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn likes_from_different_users_accumulate() {
    let app = app().await;
    let admin_cookie = login(&app, ADMIN).await;
    let id = create_event(&app, &admin_cookie, "Quiz night").await;
    let uri = format!("/api/events/{id}/like");

    for credentials in [ADMIN, MODERATOR, USER] {
        let cookie = login(&app, credentials).await;
        let response = send(&app, with_cookie(post_json(&uri, json!({})), &cookie)).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let cookie = login(&app, USER).await;
    let events = body_json(send(&app, with_cookie(get("/api/events"), &cookie)).await).await;
    assert_eq!(events[0]["likes"], 3);
}

#[tokio::test]
async fn liking_a_missing_event_is_404() {
    let app = app().await;
    let cookie = login(&app, USER).await;
    let response = send(
        &app,
        with_cookie(post_json("/api/events/9999/like", json!({})), &cookie),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn anonymous_cannot_like() {
    let app = app().await;
    let response = send(&app, post_json("/api/events/1/like", json!({}))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
