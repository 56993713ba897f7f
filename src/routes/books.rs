// SPDX-License-Identifier: MIT

//! Book collection and object CRUD.
//!
//! Reads are open to everyone; writes require staff or the book's creator.
//! Filtering, search and ordering parameters apply to reads only.

use axum::{
    extract::{Path, Query, State},
    http::{Method, StatusCode},
    routing::get,
    Extension, Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;

use crate::db::BookListQuery;
use crate::error::{AppError, Result};
use crate::middleware::MaybeUser;
use crate::models::{BookDetail, BookWrite};
use crate::permissions::{Policy, MSG_NOT_AUTHENTICATED};
use crate::routes::{double_option, require_id, require_string};
use crate::AppState;

const POLICY: Policy = Policy::IsAdminOrOwnerOrReadOnly;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/books/", get(list_books).post(create_book))
        .route(
            "/books/{id}/",
            get(get_book)
                .put(update_book)
                .patch(update_book)
                .delete(delete_book),
        )
}

/// Nullable fields are double-wrapped: the outer `Option` distinguishes an
/// absent key (keep the stored value on update) from an explicit `null`
/// (clear it).
#[derive(Debug, Deserialize)]
struct BookPayload {
    #[serde(default)]
    title: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    subtitle: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    book_url: Option<Option<String>>,
    #[serde(default)]
    author_id: Option<i64>,
    #[serde(default)]
    genre_id: Option<i64>,
    #[serde(default)]
    language: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    publication_date: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "double_option")]
    thumbnail: Option<Option<String>>,
}

async fn resolve_author(state: &AppState, author_id: i64) -> Result<()> {
    state
        .db
        .get_author(author_id)
        .await?
        .ok_or_else(|| AppError::validation("author_id", "Invalid author_id: object does not exist."))?;
    Ok(())
}

async fn resolve_genre(state: &AppState, genre_id: i64) -> Result<()> {
    state
        .db
        .get_genre(genre_id)
        .await?
        .ok_or_else(|| AppError::validation("genre_id", "Invalid genre_id: object does not exist."))?;
    Ok(())
}

async fn list_books(
    State(state): State<Arc<AppState>>,
    Extension(MaybeUser(user)): Extension<MaybeUser>,
    method: Method,
    Query(query): Query<BookListQuery>,
) -> Result<Json<Vec<BookDetail>>> {
    POLICY.check_collection(&method, user.as_ref())?;
    Ok(Json(state.db.list_books(&query).await?))
}

async fn get_book(
    State(state): State<Arc<AppState>>,
    Extension(MaybeUser(user)): Extension<MaybeUser>,
    method: Method,
    Path(id): Path<i64>,
) -> Result<Json<BookDetail>> {
    POLICY.check_collection(&method, user.as_ref())?;

    let book = state
        .db
        .get_book(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book {id} not found")))?;

    POLICY.check_object(&method, user.as_ref(), Some(book.created_by))?;

    Ok(Json(book))
}

async fn create_book(
    State(state): State<Arc<AppState>>,
    Extension(MaybeUser(user)): Extension<MaybeUser>,
    method: Method,
    Json(payload): Json<BookPayload>,
) -> Result<(StatusCode, Json<BookDetail>)> {
    POLICY.check_collection(&method, user.as_ref())?;
    let user = user.ok_or_else(|| AppError::Unauthorized(MSG_NOT_AUTHENTICATED.to_string()))?;

    let title = require_string("title", payload.title)?;
    let author_id = require_id("author_id", payload.author_id)?;
    let genre_id = require_id("genre_id", payload.genre_id)?;
    resolve_author(&state, author_id).await?;
    resolve_genre(&state, genre_id).await?;

    let write = BookWrite {
        title,
        subtitle: payload.subtitle.flatten(),
        book_url: payload.book_url.flatten(),
        author_id,
        genre_id,
        language: payload.language.unwrap_or_else(|| "English".to_string()),
        description: payload.description.flatten(),
        publication_date: payload.publication_date.flatten(),
        thumbnail: payload.thumbnail.flatten(),
    };

    let book = state.db.create_book(user.id, &write).await?;
    tracing::info!(user_id = user.id, book_id = book.id, "Book created");

    Ok((StatusCode::CREATED, Json(book)))
}

async fn update_book(
    State(state): State<Arc<AppState>>,
    Extension(MaybeUser(user)): Extension<MaybeUser>,
    method: Method,
    Path(id): Path<i64>,
    Json(payload): Json<BookPayload>,
) -> Result<Json<BookDetail>> {
    POLICY.check_collection(&method, user.as_ref())?;

    let existing = state
        .db
        .get_book(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book {id} not found")))?;

    POLICY.check_object(&method, user.as_ref(), Some(existing.created_by))?;

    if let Some(author_id) = payload.author_id {
        resolve_author(&state, author_id).await?;
    }
    if let Some(genre_id) = payload.genre_id {
        resolve_genre(&state, genre_id).await?;
    }

    let write = BookWrite {
        title: payload.title.unwrap_or(existing.title),
        subtitle: payload.subtitle.unwrap_or(existing.subtitle),
        book_url: payload.book_url.unwrap_or(existing.book_url),
        author_id: payload.author_id.unwrap_or(existing.author.id),
        genre_id: payload.genre_id.unwrap_or(existing.genre.id),
        language: payload.language.unwrap_or(existing.language),
        description: payload.description.unwrap_or(existing.description),
        publication_date: payload.publication_date.unwrap_or(existing.publication_date),
        thumbnail: payload.thumbnail.unwrap_or(existing.thumbnail),
    };

    Ok(Json(state.db.update_book(id, &write).await?))
}

async fn delete_book(
    State(state): State<Arc<AppState>>,
    Extension(MaybeUser(user)): Extension<MaybeUser>,
    method: Method,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    POLICY.check_collection(&method, user.as_ref())?;

    let existing = state
        .db
        .get_book(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Book {id} not found")))?;

    POLICY.check_object(&method, user.as_ref(), Some(existing.created_by))?;

    state.db.delete_book(id).await?;

    Ok(StatusCode::NO_CONTENT)
}
