// SPDX-License-Identifier: MIT

//! Login, token refresh and registration routes.
//!
//! Login and refresh wrap standard JWT pair issuance with the blocked-account
//! guard: a blocked user is denied fresh and refreshed tokens even with
//! correct credentials, and the denial is a 403 with an explicit message
//! rather than a generic authentication failure.

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::models::NewUser;
use crate::routes::require_string;
use crate::services::{password, TokenPair};
use crate::AppState;

pub const BLOCKED_ACCOUNT_MSG: &str = "Your account has been blocked. Please contact support.";
const LOGIN_FAILED_MSG: &str = "No active account found with the given credentials";

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/login/", post(login))
        .route("/token/refresh/", post(refresh))
        .route("/register/", post(register))
}

// ─── Login ───────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct LoginRequest {
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    password: Option<String>,
}

/// Issue a token pair for valid credentials.
///
/// The block check runs only after base validation succeeds: a blocked user
/// with correct credentials gets the explicit 403, not a credentials error.
async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<TokenPair>> {
    let email = require_string("email", body.email)?;
    let password = require_string("password", body.password)?;

    let user = state.db.get_user_by_email(&email).await?;

    // Verify against a fixed dummy hash when the email is unknown so the
    // failure path does constant work.
    let verified = match &user {
        Some(u) => password::verify_password(&password, &u.password_hash),
        None => password::verify_password(&password, password::DUMMY_HASH),
    };

    let user = match user {
        Some(u) if verified && u.is_active => u,
        _ => {
            tracing::info!(email = %email, "Login failed");
            return Err(AppError::Unauthorized(LOGIN_FAILED_MSG.to_string()));
        }
    };

    if user.is_blocked {
        tracing::warn!(user_id = user.id, "Blocked account denied login");
        return Err(AppError::PermissionDenied(BLOCKED_ACCOUNT_MSG.to_string()));
    }

    let pair = state.tokens.issue_pair(&user)?;
    tracing::info!(user_id = user.id, "Login succeeded");

    Ok(Json(pair))
}

// ─── Token Refresh ───────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RefreshRequest {
    #[serde(default)]
    refresh: Option<String>,
}

/// Exchange a refresh token for a fresh pair.
///
/// The guard does its own decode pass to recover the subject, then checks
/// existence and the block flag against the current stored row BEFORE the
/// underlying signature/expiry validation runs as the final step.
async fn refresh(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RefreshRequest>,
) -> Result<Json<TokenPair>> {
    let token = body
        .refresh
        .ok_or_else(|| AppError::validation("refresh", "This field is required."))?;

    let subject = state.tokens.peek_subject(&token)?;

    let user = match state.db.get_user_by_id(subject).await? {
        Some(user) => user,
        // A vanished subject is a validation error, not a 404; the shape is
        // kept for compatibility with existing clients.
        None => return Err(AppError::validation("error", "User does not exist")),
    };

    if user.is_blocked {
        tracing::warn!(user_id = user.id, "Blocked account denied token refresh");
        return Err(AppError::PermissionDenied(BLOCKED_ACCOUNT_MSG.to_string()));
    }

    state.tokens.verify_refresh(&token)?;

    // Rotation: both tokens are re-issued.
    let pair = state.tokens.issue_pair(&user)?;
    Ok(Json(pair))
}

// ─── Registration ────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
struct RegisterRequest {
    #[serde(default)]
    #[validate(email(message = "Enter a valid email address."))]
    email: Option<String>,
    #[serde(default)]
    #[validate(length(max = 150, message = "Ensure this field has no more than 150 characters."))]
    username: Option<String>,
    #[serde(default)]
    #[validate(length(max = 150, message = "Ensure this field has no more than 150 characters."))]
    first_name: Option<String>,
    #[serde(default)]
    #[validate(length(max = 150, message = "Ensure this field has no more than 150 characters."))]
    last_name: Option<String>,
    #[serde(default)]
    #[validate(length(max = 32, message = "Ensure this field has no more than 32 characters."))]
    phone_number: Option<String>,
    #[serde(default)]
    password: Option<String>,
    #[serde(default)]
    confirm_password: Option<String>,
}

#[derive(Serialize)]
struct RegisterResponse {
    status: String,
    message: String,
}

/// Create a user account.
///
/// Field validation runs first, then the ordered password strength rules;
/// the first failing check's message is returned, keyed by field.
async fn register(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>)> {
    let email = require_string("email", body.email.clone())?;
    let username = require_string("username", body.username.clone())?;
    let first_name = require_string("first_name", body.first_name.clone())?;
    let last_name = require_string("last_name", body.last_name.clone())?;
    let password = require_string("password", body.password.clone())?;
    let confirm_password = require_string("confirm_password", body.confirm_password.clone())?;

    body.validate().map_err(first_validation_error)?;

    password::validate_password(&password, &confirm_password)
        .map_err(|message| AppError::validation("password", message))?;

    // confirm_password is discarded here; only the hash is stored.
    let password_hash = password::hash_password(&password)?;

    let user = state
        .db
        .create_user(&NewUser {
            email,
            username,
            first_name,
            last_name,
            phone_number: body.phone_number,
            password_hash,
        })
        .await?;

    tracing::info!(user_id = user.id, "User registered");

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            status: "success".to_string(),
            message: "User created successfully.".to_string(),
        }),
    ))
}

/// Map declarative validation failures to a single field-keyed error.
fn first_validation_error(errors: validator::ValidationErrors) -> AppError {
    for (field, field_errors) in errors.field_errors() {
        if let Some(error) = field_errors.first() {
            let message = error
                .message
                .clone()
                .map(|m| m.to_string())
                .unwrap_or_else(|| format!("Invalid value for {field}."));
            return AppError::validation(field.to_string(), message);
        }
    }
    AppError::validation("non_field_errors", "Invalid request.")
}
