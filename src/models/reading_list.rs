// SPDX-License-Identifier: MIT

//! Per-user reading list models.

use crate::models::catalog::BookDetail;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Reading list entry with its nested book, as rendered in API responses.
/// Every query is scoped to the owning user; `user_id` is not serialized.
#[derive(Debug, Clone, Serialize)]
pub struct ReadingListDetail {
    pub id: i64,
    pub book: BookDetail,
    pub position: i64,
    pub date_added: DateTime<Utc>,
    #[serde(skip_serializing)]
    pub user_id: i64,
}

/// Writable reading list fields. The (user, book) pair is unique: a user
/// cannot add the same book twice.
#[derive(Debug, Clone)]
pub struct ReadingListWrite {
    pub book_id: i64,
    pub position: i64,
}
