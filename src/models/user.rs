//! User account model for storage and API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User account row.
///
/// `is_blocked` gates token issuance and refresh; `is_active` gates
/// authentication itself. Both are checked against the stored row at the
/// moment of each request, never cached.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    /// Argon2 PHC string; the clear-text password is never stored.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub is_blocked: bool,
    pub date_joined: DateTime<Utc>,
}

/// Fields required to create a user account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub password_hash: String,
}
