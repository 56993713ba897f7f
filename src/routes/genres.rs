// SPDX-License-Identifier: MIT

//! Genre collection and object CRUD.
//!
//! Genres have no owner: everyone may read, only staff may write. A genre
//! referenced by any book cannot be deleted.

use axum::{
    extract::{Path, State},
    http::{Method, StatusCode},
    routing::get,
    Extension, Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::middleware::MaybeUser;
use crate::models::Genre;
use crate::permissions::Policy;
use crate::routes::require_string;
use crate::AppState;

const POLICY: Policy = Policy::IsAdminOrReadOnly;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/genres/", get(list_genres).post(create_genre))
        .route(
            "/genres/{id}/",
            get(get_genre)
                .put(update_genre)
                .patch(update_genre)
                .delete(delete_genre),
        )
}

#[derive(Debug, Deserialize)]
struct GenrePayload {
    #[serde(default)]
    name: Option<String>,
}

async fn list_genres(
    State(state): State<Arc<AppState>>,
    Extension(MaybeUser(user)): Extension<MaybeUser>,
    method: Method,
) -> Result<Json<Vec<Genre>>> {
    POLICY.check_collection(&method, user.as_ref())?;
    Ok(Json(state.db.list_genres().await?))
}

async fn get_genre(
    State(state): State<Arc<AppState>>,
    Extension(MaybeUser(user)): Extension<MaybeUser>,
    method: Method,
    Path(id): Path<i64>,
) -> Result<Json<Genre>> {
    POLICY.check_collection(&method, user.as_ref())?;

    let genre = state
        .db
        .get_genre(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Genre {id} not found")))?;

    POLICY.check_object(&method, user.as_ref(), None)?;

    Ok(Json(genre))
}

async fn create_genre(
    State(state): State<Arc<AppState>>,
    Extension(MaybeUser(user)): Extension<MaybeUser>,
    method: Method,
    Json(payload): Json<GenrePayload>,
) -> Result<(StatusCode, Json<Genre>)> {
    POLICY.check_collection(&method, user.as_ref())?;

    let name = require_string("name", payload.name)?;
    let genre = state.db.create_genre(&name).await?;

    Ok((StatusCode::CREATED, Json(genre)))
}

async fn update_genre(
    State(state): State<Arc<AppState>>,
    Extension(MaybeUser(user)): Extension<MaybeUser>,
    method: Method,
    Path(id): Path<i64>,
    Json(payload): Json<GenrePayload>,
) -> Result<Json<Genre>> {
    POLICY.check_collection(&method, user.as_ref())?;

    let existing = state
        .db
        .get_genre(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Genre {id} not found")))?;

    POLICY.check_object(&method, user.as_ref(), None)?;

    let name = payload.name.unwrap_or(existing.name);
    Ok(Json(state.db.update_genre(id, &name).await?))
}

async fn delete_genre(
    State(state): State<Arc<AppState>>,
    Extension(MaybeUser(user)): Extension<MaybeUser>,
    method: Method,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    POLICY.check_collection(&method, user.as_ref())?;

    state
        .db
        .get_genre(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Genre {id} not found")))?;

    POLICY.check_object(&method, user.as_ref(), None)?;

    state.db.delete_genre(id).await?;

    Ok(StatusCode::NO_CONTENT)
}
