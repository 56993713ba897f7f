// SPDX-License-Identifier: MIT

//! Author collection and object CRUD.
//!
//! Same access model as books: reads open, writes require staff or the
//! creating user. Listing is ordered by first name, then last name.

use axum::{
    extract::{Path, State},
    http::{Method, StatusCode},
    routing::get,
    Extension, Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::middleware::MaybeUser;
use crate::models::{AuthorDetail, AuthorWrite};
use crate::permissions::{Policy, MSG_NOT_AUTHENTICATED};
use crate::routes::{double_option, require_string};
use crate::AppState;

const POLICY: Policy = Policy::IsAdminOrOwnerOrReadOnly;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/authors/", get(list_authors).post(create_author))
        .route(
            "/authors/{id}/",
            get(get_author)
                .put(update_author)
                .patch(update_author)
                .delete(delete_author),
        )
}

/// Date fields are double-wrapped so an update can distinguish an absent
/// key (keep the stored value) from an explicit `null` (clear it).
#[derive(Debug, Deserialize)]
struct AuthorPayload {
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    last_name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    date_of_birth: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "double_option")]
    date_of_death: Option<Option<NaiveDate>>,
}

async fn list_authors(
    State(state): State<Arc<AppState>>,
    Extension(MaybeUser(user)): Extension<MaybeUser>,
    method: Method,
) -> Result<Json<Vec<AuthorDetail>>> {
    POLICY.check_collection(&method, user.as_ref())?;

    let authors = state.db.list_authors().await?;
    Ok(Json(authors.into_iter().map(AuthorDetail::from).collect()))
}

async fn get_author(
    State(state): State<Arc<AppState>>,
    Extension(MaybeUser(user)): Extension<MaybeUser>,
    method: Method,
    Path(id): Path<i64>,
) -> Result<Json<AuthorDetail>> {
    POLICY.check_collection(&method, user.as_ref())?;

    let author = state
        .db
        .get_author(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Author {id} not found")))?;

    POLICY.check_object(&method, user.as_ref(), Some(author.created_by))?;

    Ok(Json(author.into()))
}

async fn create_author(
    State(state): State<Arc<AppState>>,
    Extension(MaybeUser(user)): Extension<MaybeUser>,
    method: Method,
    Json(payload): Json<AuthorPayload>,
) -> Result<(StatusCode, Json<AuthorDetail>)> {
    POLICY.check_collection(&method, user.as_ref())?;
    let user = user.ok_or_else(|| AppError::Unauthorized(MSG_NOT_AUTHENTICATED.to_string()))?;

    let write = AuthorWrite {
        first_name: require_string("first_name", payload.first_name)?,
        last_name: require_string("last_name", payload.last_name)?,
        date_of_birth: payload.date_of_birth.flatten(),
        date_of_death: payload.date_of_death.flatten(),
    };

    let author = state.db.create_author(user.id, &write).await?;
    tracing::info!(user_id = user.id, author_id = author.id, "Author created");

    Ok((StatusCode::CREATED, Json(author.into())))
}

async fn update_author(
    State(state): State<Arc<AppState>>,
    Extension(MaybeUser(user)): Extension<MaybeUser>,
    method: Method,
    Path(id): Path<i64>,
    Json(payload): Json<AuthorPayload>,
) -> Result<Json<AuthorDetail>> {
    POLICY.check_collection(&method, user.as_ref())?;

    let existing = state
        .db
        .get_author(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Author {id} not found")))?;

    POLICY.check_object(&method, user.as_ref(), Some(existing.created_by))?;

    let write = AuthorWrite {
        first_name: payload.first_name.unwrap_or(existing.first_name),
        last_name: payload.last_name.unwrap_or(existing.last_name),
        date_of_birth: payload.date_of_birth.unwrap_or(existing.date_of_birth),
        date_of_death: payload.date_of_death.unwrap_or(existing.date_of_death),
    };

    let author = state.db.update_author(id, &write).await?;
    Ok(Json(author.into()))
}

async fn delete_author(
    State(state): State<Arc<AppState>>,
    Extension(MaybeUser(user)): Extension<MaybeUser>,
    method: Method,
    Path(id): Path<i64>,
) -> Result<StatusCode> {
    POLICY.check_collection(&method, user.as_ref())?;

    let existing = state
        .db
        .get_author(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Author {id} not found")))?;

    POLICY.check_object(&method, user.as_ref(), Some(existing.created_by))?;

    state.db.delete_author(id).await?;

    Ok(StatusCode::NO_CONTENT)
}
