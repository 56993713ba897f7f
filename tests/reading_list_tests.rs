// SPDX-License-Identifier: MIT

//! Reading list tests: strict per-user scoping and (user, book) uniqueness.

use axum::http::StatusCode;
use axum::Router;
use bookshelf::AppState;
use serde_json::json;
use std::sync::Arc;

mod common;

/// Seed a book owned by the given token's user; returns the book id.
async fn seed_book(app: &Router, state: &Arc<AppState>, token: &str, title: &str) -> i64 {
    let (genre_id, author_id) = common::seed_catalog(app, state, token).await;
    seed_book_with(app, token, title, author_id, genre_id).await
}

async fn seed_book_with(app: &Router, token: &str, title: &str, author_id: i64, genre_id: i64) -> i64 {
    let (status, body) = common::send_json(
        app,
        "POST",
        "/books/",
        Some(token),
        Some(json!({ "title": title, "author_id": author_id, "genre_id": genre_id })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "seed book failed: {body}");
    body["id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_anonymous_read_is_401() {
    let (app, _state) = common::create_test_app().await;

    let (status, body) = common::send_json(&app, "GET", "/reading-list/", None, None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "Authentication credentials were not provided.");
}

#[tokio::test]
async fn test_add_book_to_reading_list() {
    let (app, state) = common::create_test_app().await;
    common::seed_user(&state, "ada@example.com", "ada", "Str0ng!pass").await;
    let (token, _) = common::login(&app, "ada@example.com", "Str0ng!pass").await;
    let book_id = seed_book(&app, &state, &token, "Kindred").await;

    let (status, body) = common::send_json(
        &app,
        "POST",
        "/reading-list/",
        Some(&token),
        Some(json!({ "book_id": book_id, "position": 3 })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED, "create failed: {body}");
    assert_eq!(body["position"], 3);
    assert_eq!(body["book"]["title"], "Kindred");
    assert_eq!(body["book"]["author"]["full_name"], "Ursula Le Guin");
    assert!(body.get("user_id").is_none());
}

#[tokio::test]
async fn test_position_defaults_to_zero() {
    let (app, state) = common::create_test_app().await;
    common::seed_user(&state, "ada@example.com", "ada", "Str0ng!pass").await;
    let (token, _) = common::login(&app, "ada@example.com", "Str0ng!pass").await;
    let book_id = seed_book(&app, &state, &token, "Kindred").await;

    let (status, body) = common::send_json(
        &app,
        "POST",
        "/reading-list/",
        Some(&token),
        Some(json!({ "book_id": book_id })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["position"], 0);
}

#[tokio::test]
async fn test_duplicate_book_rejected() {
    let (app, state) = common::create_test_app().await;
    common::seed_user(&state, "ada@example.com", "ada", "Str0ng!pass").await;
    let (token, _) = common::login(&app, "ada@example.com", "Str0ng!pass").await;
    let book_id = seed_book(&app, &state, &token, "Kindred").await;

    let payload = json!({ "book_id": book_id });
    let (status, _) = common::send_json(
        &app,
        "POST",
        "/reading-list/",
        Some(&token),
        Some(payload.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) =
        common::send_json(&app, "POST", "/reading-list/", Some(&token), Some(payload)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["book_id"], "This book is already in your reading list.");
}

#[tokio::test]
async fn test_unknown_book_id_rejected() {
    let (app, state) = common::create_test_app().await;
    common::seed_user(&state, "ada@example.com", "ada", "Str0ng!pass").await;
    let (token, _) = common::login(&app, "ada@example.com", "Str0ng!pass").await;

    let (status, body) = common::send_json(
        &app,
        "POST",
        "/reading-list/",
        Some(&token),
        Some(json!({ "book_id": 4242 })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["book_id"], "Invalid book_id: object does not exist.");
}

#[tokio::test]
async fn test_entries_are_scoped_per_user() {
    let (app, state) = common::create_test_app().await;
    common::seed_user(&state, "ada@example.com", "ada", "Str0ng!pass").await;
    common::seed_user(&state, "bob@example.com", "bob", "Str0ng!pass").await;
    let (ada_token, _) = common::login(&app, "ada@example.com", "Str0ng!pass").await;
    let (bob_token, _) = common::login(&app, "bob@example.com", "Str0ng!pass").await;
    let book_id = seed_book(&app, &state, &ada_token, "Kindred").await;

    let (_, entry) = common::send_json(
        &app,
        "POST",
        "/reading-list/",
        Some(&ada_token),
        Some(json!({ "book_id": book_id })),
    )
    .await;
    let entry_id = entry["id"].as_i64().unwrap();

    // Bob's list stays empty and Ada's entry does not even read as existing
    // to him.
    let (status, body) =
        common::send_json(&app, "GET", "/reading-list/", Some(&bob_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    let (status, _) = common::send_json(
        &app,
        "GET",
        &format!("/reading-list/{entry_id}/"),
        Some(&bob_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = common::send_json(
        &app,
        "DELETE",
        &format!("/reading-list/{entry_id}/"),
        Some(&bob_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_position() {
    let (app, state) = common::create_test_app().await;
    common::seed_user(&state, "ada@example.com", "ada", "Str0ng!pass").await;
    let (token, _) = common::login(&app, "ada@example.com", "Str0ng!pass").await;
    let book_id = seed_book(&app, &state, &token, "Kindred").await;

    let (_, entry) = common::send_json(
        &app,
        "POST",
        "/reading-list/",
        Some(&token),
        Some(json!({ "book_id": book_id })),
    )
    .await;
    let entry_id = entry["id"].as_i64().unwrap();

    let (status, body) = common::send_json(
        &app,
        "PATCH",
        &format!("/reading-list/{entry_id}/"),
        Some(&token),
        Some(json!({ "position": 7 })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["position"], 7);
    assert_eq!(body["book"]["title"], "Kindred");
}

#[tokio::test]
async fn test_search_and_ordering() {
    let (app, state) = common::create_test_app().await;
    common::seed_user(&state, "ada@example.com", "ada", "Str0ng!pass").await;
    let (token, _) = common::login(&app, "ada@example.com", "Str0ng!pass").await;
    let (genre_id, author_id) = common::seed_catalog(&app, &state, &token).await;

    for (title, position) in [("Kindred", 2), ("Dawn", 1), ("Wild Seed", 3)] {
        let book_id = seed_book_with(&app, &token, title, author_id, genre_id).await;
        let (status, _) = common::send_json(
            &app,
            "POST",
            "/reading-list/",
            Some(&token),
            Some(json!({ "book_id": book_id, "position": position })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    // Default ordering is by position.
    let (status, body) = common::send_json(&app, "GET", "/reading-list/", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let titles: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["book"]["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Dawn", "Kindred", "Wild Seed"]);

    // Descending position.
    let (status, body) = common::send_json(
        &app,
        "GET",
        "/reading-list/?ordering=-position",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["book"]["title"], "Wild Seed");

    // Search over book titles.
    let (status, body) = common::send_json(
        &app,
        "GET",
        "/reading-list/?search=Kind",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let entries = body.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["book"]["title"], "Kindred");

    // Exact title filter; substrings do not match.
    let (status, body) = common::send_json(
        &app,
        "GET",
        "/reading-list/?book__title=Wild%20Seed",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let entries = body.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["book"]["title"], "Wild Seed");

    let (status, body) = common::send_json(
        &app,
        "GET",
        "/reading-list/?book__title=Wild",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}
