// SPDX-License-Identifier: MIT

//! Per-user reading list CRUD.
//!
//! Scoped strictly to the requester: even reads require authentication, and
//! an entry belonging to another user reads as 404. The (user, book) pair is
//! unique - adding the same book twice fails.

use axum::{
    extract::{Path, Query, State},
    http::{Method, StatusCode},
    routing::get,
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::db::ReadingListQuery;
use crate::error::{AppError, Result};
use crate::middleware::MaybeUser;
use crate::models::{ReadingListDetail, ReadingListWrite};
use crate::permissions::{Policy, MSG_NOT_AUTHENTICATED};
use crate::routes::require_id;
use crate::AppState;

const POLICY: Policy = Policy::IsOwner;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/reading-list/", get(list_entries).post(create_entry))
        .route(
            "/reading-list/{id}/",
            get(get_entry)
                .put(update_entry)
                .patch(update_entry)
                .delete(delete_entry),
        )
}

#[derive(Debug, Deserialize)]
struct ReadingListPayload {
    #[serde(default)]
    book_id: Option<i64>,
    #[serde(default)]
    position: Option<i64>,
}

async fn resolve_book(state: &AppState, book_id: i64) -> Result<()> {
    state
        .db
        .get_book(book_id)
        .await?
        .ok_or_else(|| AppError::validation("book_id", "Invalid book_id: object does not exist."))?;
    Ok(())
}

async fn list_entries(
    State(state): State<Arc<AppState>>,
    Extension(MaybeUser(user)): Extension<MaybeUser>,
    method: Method,
    Query(query): Query<ReadingListQuery>,
) -> Result<Json<Vec<ReadingListDetail>>> {
    POLICY.check_collection(&method, user.as_ref())?;
    let user = user.ok_or_else(|| AppError::Unauthorized(MSG_NOT_AUTHENTICATED.to_string()))?;

    Ok(Json(state.db.list_reading_list(user.id, &query).await?))
}

async fn get_entry(
    State(state): State<Arc<AppState>>,
    Extension(MaybeUser(user)): Extension<MaybeUser>,
    method: Method,
    Path(id): Path<i64>,
) -> Result<Json<ReadingListDetail>> {
    POLICY.check_collection(&method, user.as_ref())?;
    let user = user.ok_or_else(|| AppError::Unauthorized(MSG_NOT_AUTHENTICATED.to_string()))?;

    let entry = state
        .db
        .get_reading_list_entry(user.id, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Reading list entry {id} not found")))?;

    POLICY.check_object(&method, Some(&user), Some(entry.user_id))?;

    Ok(Json(entry))
}

async fn create_entry(
    State(state): State<Arc<AppState>>,
    Extension(MaybeUser(user)): Extension<MaybeUser>,
    method: Method,
    Json(payload): Json<ReadingListPayload>,
) -> Result<(StatusCode, Json<ReadingListDetail>)> {
    POLICY.check_collection(&method, user.as_ref())?;
    let user = user.ok_or_else(|| AppError::Unauthorized(MSG_NOT_AUTHENTICATED.to_string()))?;

    let book_id = require_id("book_id", payload.book_id)?;
    resolve_book(&state, book_id).await?;

    let write = ReadingListWrite {
        book_id,
        position: payload.position.unwrap_or(0),
    };

    let entry = state.db.create_reading_list_entry(user.id, &write).await?;
    tracing::info!(user_id = user.id, book_id, "Reading list entry created");

    Ok((StatusCode::CREATED, Json(entry)))
}

async fn update_entry(
    State(state): State<Arc<AppState>>,
    Extension(MaybeUser(user)): Extension<MaybeUser>,
    method: Method,
    Path(id): Path<i64>,
    Json(payload): Json<ReadingListPayload>,
) -> Result<Json<ReadingListDetail>> {
    POLICY.check_collection(&method, user.as_ref())?;
    let user = user.ok_or_else(|| AppError::Unauthorized(MSG_NOT_AUTHENTICATED.to_string()))?;

    let existing = state
        .db
        .get_reading_list_entry(user.id, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Reading list entry {id} not found")))?;

    POLICY.check_object(&method, Some(&user), Some(existing.user_id))?;

    if let Some(book_id) = payload.book_id {
        resolve_book(&state, book_id).await?;
    }

    let write = ReadingListWrite {
        book_id: payload.book_id.unwrap_or(existing.book.id),
        position: payload.position.unwrap_or(existing.position),
    };

    let entry = state
        .db
        .update_reading_list_entry(user.id, id, &write)
        .await?;
    Ok(Json(entry))
}

async fn delete_entry(
    State(state): State<Arc<AppState>>,
    Extension(MaybeUser(user)): Extension<MaybeUser>,
    method: Method,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    POLICY.check_collection(&method, user.as_ref())?;
    let user = user.ok_or_else(|| AppError::Unauthorized(MSG_NOT_AUTHENTICATED.to_string()))?;

    let existing = state
        .db
        .get_reading_list_entry(user.id, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Reading list entry {id} not found")))?;

    POLICY.check_object(&method, Some(&user), Some(existing.user_id))?;

    state.db.delete_reading_list_entry(user.id, id).await?;

    Ok(StatusCode::NO_CONTENT)
}
