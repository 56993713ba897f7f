// SPDX-License-Identifier: MIT

//! Catalog models: authors, genres and books.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Author row. `created_by` is the owning user; it is not serialized.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Author {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub date_of_death: Option<NaiveDate>,
    pub created_by: i64,
}

impl Author {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Author as rendered in API responses, with the computed `full_name`.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorDetail {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub date_of_death: Option<NaiveDate>,
    pub full_name: String,
    #[serde(skip_serializing)]
    pub created_by: i64,
}

impl From<Author> for AuthorDetail {
    fn from(author: Author) -> Self {
        let full_name = author.full_name();
        Self {
            id: author.id,
            first_name: author.first_name,
            last_name: author.last_name,
            date_of_birth: author.date_of_birth,
            date_of_death: author.date_of_death,
            full_name,
            created_by: author.created_by,
        }
    }
}

/// Writable author fields.
#[derive(Debug, Clone)]
pub struct AuthorWrite {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub date_of_death: Option<NaiveDate>,
}

/// Genre row. Genres have no owner; writes are staff-only.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Genre {
    pub id: i64,
    pub name: String,
}

/// Book as rendered in API responses: nested author and genre objects,
/// ownership hidden. Writes go through [`BookWrite`] instead.
#[derive(Debug, Clone, Serialize)]
pub struct BookDetail {
    pub id: i64,
    pub title: String,
    pub subtitle: Option<String>,
    pub book_url: Option<String>,
    pub language: String,
    pub description: Option<String>,
    pub publication_date: Option<NaiveDate>,
    pub thumbnail: Option<String>,
    pub author: AuthorDetail,
    pub genre: Genre,
    #[serde(skip_serializing)]
    pub created_by: i64,
}

/// Writable book fields. `created_by` is set from the requester on create
/// and never writable afterwards.
#[derive(Debug, Clone)]
pub struct BookWrite {
    pub title: String,
    pub subtitle: Option<String>,
    pub book_url: Option<String>,
    pub author_id: i64,
    pub genre_id: i64,
    pub language: String,
    pub description: Option<String>,
    pub publication_date: Option<NaiveDate>,
    pub thumbnail: Option<String>,
}
