// SPDX-License-Identifier: MIT

//! Shared helpers: in-memory test app, seeding and request plumbing.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use bookshelf::config::Config;
use bookshelf::db::SqliteDb;
use bookshelf::models::{NewUser, User};
use bookshelf::routes::create_router;
use bookshelf::services::{password, TokenService};
use bookshelf::AppState;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

/// Create a test app backed by an in-memory database.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub async fn create_test_app() -> (Router, Arc<AppState>) {
    let config = Config::test_default();
    let db = SqliteDb::in_memory().await.expect("in-memory database");
    let tokens = TokenService::new(&config);

    let state = Arc::new(AppState { config, db, tokens });

    (create_router(state.clone()), state)
}

/// Seed a plain user directly in the store.
#[allow(dead_code)]
pub async fn seed_user(state: &Arc<AppState>, email: &str, username: &str, pass: &str) -> User {
    let password_hash = password::hash_password(pass).expect("hash password");
    state
        .db
        .create_user(&NewUser {
            email: email.to_string(),
            username: username.to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            phone_number: None,
            password_hash,
        })
        .await
        .expect("seed user")
}

/// Seed a staff user directly in the store.
#[allow(dead_code)]
pub async fn seed_staff_user(
    state: &Arc<AppState>,
    email: &str,
    username: &str,
    pass: &str,
) -> User {
    let user = seed_user(state, email, username, pass).await;
    state
        .db
        .set_user_staff(user.id, true)
        .await
        .expect("set staff flag");
    state
        .db
        .get_user_by_id(user.id)
        .await
        .expect("reload user")
        .expect("user exists")
}

/// Send a JSON request and return (status, parsed body). Empty response
/// bodies (204) come back as `Value::Null`.
#[allow(dead_code)]
pub async fn send_json(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }

    let request = match body {
        Some(value) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(value.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };

    (status, value)
}

/// Log a user in and return the (access, refresh) pair.
#[allow(dead_code)]
pub async fn login(app: &Router, email: &str, pass: &str) -> (String, String) {
    let (status, body) = send_json(
        app,
        "POST",
        "/login/",
        None,
        Some(json!({ "email": email, "password": pass })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "login failed: {body}");

    (
        body["access"].as_str().expect("access token").to_string(),
        body["refresh"].as_str().expect("refresh token").to_string(),
    )
}

/// Seed a genre and an author (owned by `owner_token`'s user via the API)
/// and return (genre_id, author_id). Genres are staff-only, so they are
/// created directly in the store.
#[allow(dead_code)]
pub async fn seed_catalog(app: &Router, state: &Arc<AppState>, owner_token: &str) -> (i64, i64) {
    let genre = state.db.create_genre("Fantasy").await.expect("seed genre");

    let (status, author) = send_json(
        app,
        "POST",
        "/authors/",
        Some(owner_token),
        Some(json!({ "first_name": "Ursula", "last_name": "Le Guin" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "seed author failed: {author}");

    (genre.id, author["id"].as_i64().expect("author id"))
}
