// SPDX-License-Identifier: MIT

//! Bearer-token identity resolution.
//!
//! Resource routes run [`identify`]: requests without an `Authorization`
//! header pass through as anonymous (the permission predicates decide what
//! anonymous requesters may do), while a presented token must be fully
//! valid - an invalid token is a 401 even on safe methods.

use crate::error::AppError;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Requester identity resolved from a verified access token and a fresh
/// store lookup. This is what the permission predicates see.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
    pub is_staff: bool,
}

/// Requester identity, possibly anonymous. Inserted into request extensions
/// by [`identify`] for every resource request.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<CurrentUser>);

/// Middleware resolving the requester from a `Bearer` access token.
///
/// The subject is re-read from the store on every request; a vanished or
/// deactivated account is rejected even if its token is still valid.
/// Blocking is not consulted here: it gates token issuance and refresh only.
pub async fn identify(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let bearer = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "));

    let user = match bearer {
        None => None,
        Some(token) => {
            let claims = state.tokens.verify_access(token)?;
            let user_id: i64 = claims.sub.parse().map_err(|_| AppError::InvalidToken)?;

            let user = state
                .db
                .get_user_by_id(user_id)
                .await?
                .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;

            if !user.is_active {
                tracing::warn!(user_id, "Inactive account presented a valid token");
                return Err(AppError::Unauthorized("User is inactive".to_string()));
            }

            Some(CurrentUser {
                id: user.id,
                username: user.username,
                is_staff: user.is_staff,
            })
        }
    };

    request.extensions_mut().insert(MaybeUser(user));

    Ok(next.run(request).await)
}
