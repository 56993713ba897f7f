// SPDX-License-Identifier: MIT

//! HTTP route handlers.

pub mod auth;
pub mod authors;
pub mod books;
pub mod genres;
pub mod reading_list;

use crate::error::AppError;
use crate::middleware::identify;
use crate::AppState;
use axum::http::{header, Method};
use axum::{middleware, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Health check response
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Reject a missing or blank required field with the standard message.
pub(crate) fn require_string(field: &str, value: Option<String>) -> Result<String, AppError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(AppError::validation(field, "This field is required.")),
    }
}

/// Reject a missing required id field with the standard message.
pub(crate) fn require_id(field: &str, value: Option<i64>) -> Result<i64, AppError> {
    value.ok_or_else(|| AppError::validation(field, "This field is required."))
}

/// Deserialize a double-`Option` field so a key that is present — even as an
/// explicit `null` — lands in the outer `Some`, staying distinct from an
/// absent key (which `#[serde(default)]` leaves as the outer `None`).
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: serde::Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    serde::Deserialize::deserialize(deserializer).map(Some)
}

/// Build the complete router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    // CORS layer - allow requests from frontend URL and localhost (for dev)
    let frontend_url = state.config.frontend_url.clone();
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::AllowOrigin::predicate(
            move |origin: &axum::http::HeaderValue, _request_parts: &axum::http::request::Parts| {
                let origin_str = origin.to_str().unwrap_or("");
                origin_str == frontend_url
                    || origin_str.starts_with("http://localhost")
                    || origin_str.starts_with("http://127.0.0.1")
            },
        ))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT]);

    // Public routes (login, refresh, registration)
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .merge(auth::routes());

    // Resource routes run the identify middleware: anonymous requesters pass
    // through, presented tokens must be valid. The permission predicates in
    // each handler decide what the resolved identity may do.
    let resource_routes = Router::new()
        .merge(books::routes())
        .merge(authors::routes())
        .merge(genres::routes())
        .merge(reading_list::routes())
        .route_layer(middleware::from_fn_with_state(state.clone(), identify));

    Router::new()
        .merge(public_routes)
        .merge(resource_routes)
        .layer(middleware::from_fn(
            crate::middleware::security::add_security_headers,
        ))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}
