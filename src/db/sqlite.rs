// SPDX-License-Identifier: MIT

//! SQLite client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (accounts, block/staff flags)
//! - Authors, Genres, Books (catalog)
//! - Reading lists (per-user, scoped queries)
//!
//! Uniqueness and referential integrity live in the schema; this layer
//! translates constraint violations into field-keyed validation errors.

use crate::error::AppError;
use crate::models::{
    Author, AuthorWrite, BookDetail, BookWrite, Genre, NewUser, ReadingListDetail,
    ReadingListWrite, User,
};
use chrono::Utc;
use serde::Deserialize;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{QueryBuilder, Row, SqlitePool};
use std::str::FromStr;

/// Aliased column list shared by every query that renders a book with its
/// nested author and genre.
const BOOK_COLUMNS: &str = "b.id AS b_id, b.created_by AS b_created_by, b.title AS b_title, \
     b.subtitle AS b_subtitle, b.book_url AS b_book_url, b.language AS b_language, \
     b.description AS b_description, b.publication_date AS b_publication_date, \
     b.thumbnail AS b_thumbnail, \
     a.id AS a_id, a.first_name AS a_first_name, a.last_name AS a_last_name, \
     a.date_of_birth AS a_date_of_birth, a.date_of_death AS a_date_of_death, \
     a.created_by AS a_created_by, \
     g.id AS g_id, g.name AS g_name";

const BOOK_JOINS: &str =
    "FROM books b JOIN authors a ON a.id = b.author_id JOIN genres g ON g.id = b.genre_id";

/// Query parameters accepted by the book listing. Filtering, search and
/// ordering apply to safe (read) methods only.
#[derive(Debug, Default, Deserialize)]
pub struct BookListQuery {
    /// Exact genre id filter
    pub genre: Option<i64>,
    /// Exact author id filter
    pub author: Option<i64>,
    /// Exact language filter
    pub language: Option<String>,
    /// Substring search over title, subtitle and author names
    pub search: Option<String>,
    /// Ordering key: publication_date | created_at | title, `-` for descending
    pub ordering: Option<String>,
}

/// Query parameters accepted by the reading list listing.
#[derive(Debug, Default, Deserialize)]
pub struct ReadingListQuery {
    /// Exact book title filter; the parameter name follows the product's
    /// existing URL scheme
    #[serde(rename = "book__title")]
    pub book_title: Option<String>,
    /// Substring search over book title and author names
    pub search: Option<String>,
    /// Ordering key: position | date_added, `-` for descending
    pub ordering: Option<String>,
}

/// SQLite database client.
#[derive(Clone)]
pub struct SqliteDb {
    pool: SqlitePool,
}

impl SqliteDb {
    /// Open (creating if missing) the database at `database_url` and run
    /// pending migrations.
    pub async fn connect(database_url: &str) -> Result<Self, AppError> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| AppError::Database(format!("Invalid database URL: {}", e)))?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(db_err)?;

        Self::with_pool(pool).await
    }

    /// In-memory database for tests. A single connection keeps every query
    /// on the same in-memory instance.
    pub async fn in_memory() -> Result<Self, AppError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| AppError::Database(e.to_string()))?
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(db_err)?;

        Self::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> Result<Self, AppError> {
        sqlx::migrate!()
            .run(&pool)
            .await
            .map_err(|e| AppError::Database(format!("Migrations failed: {}", e)))?;

        Ok(Self { pool })
    }

    // ─── User Operations ─────────────────────────────────────────

    pub async fn get_user_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)
    }

    /// Create a user account. Starts active, non-staff and non-blocked.
    /// Unique violations come back as field-keyed validation errors.
    pub async fn create_user(&self, new: &NewUser) -> Result<User, AppError> {
        let result = sqlx::query(
            "INSERT INTO users (email, username, first_name, last_name, phone_number, \
             password_hash, date_joined) VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&new.email)
        .bind(&new.username)
        .bind(&new.first_name)
        .bind(&new.last_name)
        .bind(&new.phone_number)
        .bind(&new.password_hash)
        .bind(Utc::now())
        .execute(&self.pool)
        .await;

        let result = match result {
            Ok(r) => r,
            Err(e) if unique_violation(&e, "users.email") => {
                return Err(AppError::validation(
                    "email",
                    "A user with this email already exists.",
                ))
            }
            Err(e) if unique_violation(&e, "users.username") => {
                return Err(AppError::validation(
                    "username",
                    "A user with that username already exists.",
                ))
            }
            Err(e) => return Err(db_err(e)),
        };

        self.get_user_by_id(result.last_insert_rowid())
            .await?
            .ok_or_else(|| AppError::Database("User row missing after insert".to_string()))
    }

    /// Administrative: set the block flag. There is no HTTP surface for
    /// this; blocking is an out-of-band action.
    pub async fn set_user_blocked(&self, id: i64, blocked: bool) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET is_blocked = ? WHERE id = ?")
            .bind(blocked)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    /// Administrative: set the staff flag.
    pub async fn set_user_staff(&self, id: i64, staff: bool) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET is_staff = ? WHERE id = ?")
            .bind(staff)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    /// Administrative: set the active flag.
    pub async fn set_user_active(&self, id: i64, active: bool) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET is_active = ? WHERE id = ?")
            .bind(active)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    // ─── Author Operations ───────────────────────────────────────

    pub async fn list_authors(&self) -> Result<Vec<Author>, AppError> {
        sqlx::query_as::<_, Author>("SELECT * FROM authors ORDER BY first_name, last_name")
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)
    }

    pub async fn get_author(&self, id: i64) -> Result<Option<Author>, AppError> {
        sqlx::query_as::<_, Author>("SELECT * FROM authors WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)
    }

    pub async fn create_author(
        &self,
        created_by: i64,
        write: &AuthorWrite,
    ) -> Result<Author, AppError> {
        let result = sqlx::query(
            "INSERT INTO authors (first_name, last_name, date_of_birth, date_of_death, \
             created_by) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&write.first_name)
        .bind(&write.last_name)
        .bind(write.date_of_birth)
        .bind(write.date_of_death)
        .bind(created_by)
        .execute(&self.pool)
        .await
        .map_err(map_author_unique)?;

        self.get_author(result.last_insert_rowid())
            .await?
            .ok_or_else(|| AppError::Database("Author row missing after insert".to_string()))
    }

    pub async fn update_author(&self, id: i64, write: &AuthorWrite) -> Result<Author, AppError> {
        sqlx::query(
            "UPDATE authors SET first_name = ?, last_name = ?, date_of_birth = ?, \
             date_of_death = ? WHERE id = ?",
        )
        .bind(&write.first_name)
        .bind(&write.last_name)
        .bind(write.date_of_birth)
        .bind(write.date_of_death)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(map_author_unique)?;

        self.get_author(id)
            .await?
            .ok_or_else(|| AppError::Database("Author row missing after update".to_string()))
    }

    /// Delete an author. Fails while any book references them (RESTRICT).
    pub async fn delete_author(&self, id: i64) -> Result<(), AppError> {
        match sqlx::query("DELETE FROM authors WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
        {
            Ok(_) => Ok(()),
            Err(e) if foreign_key_violation(&e) => Err(AppError::validation(
                "detail",
                "Cannot delete author: it is referenced by existing books.",
            )),
            Err(e) => Err(db_err(e)),
        }
    }

    // ─── Genre Operations ────────────────────────────────────────

    pub async fn list_genres(&self) -> Result<Vec<Genre>, AppError> {
        sqlx::query_as::<_, Genre>("SELECT * FROM genres ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)
    }

    pub async fn get_genre(&self, id: i64) -> Result<Option<Genre>, AppError> {
        sqlx::query_as::<_, Genre>("SELECT * FROM genres WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)
    }

    pub async fn create_genre(&self, name: &str) -> Result<Genre, AppError> {
        let result = sqlx::query("INSERT INTO genres (name) VALUES (?)")
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(map_genre_unique)?;

        self.get_genre(result.last_insert_rowid())
            .await?
            .ok_or_else(|| AppError::Database("Genre row missing after insert".to_string()))
    }

    pub async fn update_genre(&self, id: i64, name: &str) -> Result<Genre, AppError> {
        sqlx::query("UPDATE genres SET name = ? WHERE id = ?")
            .bind(name)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(map_genre_unique)?;

        self.get_genre(id)
            .await?
            .ok_or_else(|| AppError::Database("Genre row missing after update".to_string()))
    }

    /// Delete a genre. Fails while any book references it (RESTRICT).
    pub async fn delete_genre(&self, id: i64) -> Result<(), AppError> {
        match sqlx::query("DELETE FROM genres WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
        {
            Ok(_) => Ok(()),
            Err(e) if foreign_key_violation(&e) => Err(AppError::validation(
                "detail",
                "Cannot delete genre: it is referenced by existing books.",
            )),
            Err(e) => Err(db_err(e)),
        }
    }

    // ─── Book Operations ─────────────────────────────────────────

    pub async fn list_books(&self, query: &BookListQuery) -> Result<Vec<BookDetail>, AppError> {
        let mut builder =
            QueryBuilder::new(format!("SELECT {BOOK_COLUMNS} {BOOK_JOINS} WHERE 1 = 1"));

        if let Some(genre) = query.genre {
            builder.push(" AND b.genre_id = ").push_bind(genre);
        }
        if let Some(author) = query.author {
            builder.push(" AND b.author_id = ").push_bind(author);
        }
        if let Some(language) = &query.language {
            builder.push(" AND b.language = ").push_bind(language.clone());
        }
        if let Some(search) = &query.search {
            let pattern = format!("%{}%", search);
            builder
                .push(" AND (b.title LIKE ")
                .push_bind(pattern.clone())
                .push(" OR b.subtitle LIKE ")
                .push_bind(pattern.clone())
                .push(" OR a.first_name LIKE ")
                .push_bind(pattern.clone())
                .push(" OR a.last_name LIKE ")
                .push_bind(pattern)
                .push(")");
        }

        builder
            .push(" ORDER BY ")
            .push(book_order(query.ordering.as_deref()));

        let rows = builder.build().fetch_all(&self.pool).await.map_err(db_err)?;
        rows.iter()
            .map(book_detail_from_row)
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .map_err(db_err)
    }

    pub async fn get_book(&self, id: i64) -> Result<Option<BookDetail>, AppError> {
        let sql = format!("SELECT {BOOK_COLUMNS} {BOOK_JOINS} WHERE b.id = ?");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        row.as_ref()
            .map(book_detail_from_row)
            .transpose()
            .map_err(db_err)
    }

    pub async fn create_book(
        &self,
        created_by: i64,
        write: &BookWrite,
    ) -> Result<BookDetail, AppError> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO books (created_by, title, subtitle, book_url, author_id, genre_id, \
             language, description, publication_date, thumbnail, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(created_by)
        .bind(&write.title)
        .bind(&write.subtitle)
        .bind(&write.book_url)
        .bind(write.author_id)
        .bind(write.genre_id)
        .bind(&write.language)
        .bind(&write.description)
        .bind(write.publication_date)
        .bind(&write.thumbnail)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        self.get_book(result.last_insert_rowid())
            .await?
            .ok_or_else(|| AppError::Database("Book row missing after insert".to_string()))
    }

    pub async fn update_book(&self, id: i64, write: &BookWrite) -> Result<BookDetail, AppError> {
        sqlx::query(
            "UPDATE books SET title = ?, subtitle = ?, book_url = ?, author_id = ?, \
             genre_id = ?, language = ?, description = ?, publication_date = ?, \
             thumbnail = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&write.title)
        .bind(&write.subtitle)
        .bind(&write.book_url)
        .bind(write.author_id)
        .bind(write.genre_id)
        .bind(&write.language)
        .bind(&write.description)
        .bind(write.publication_date)
        .bind(&write.thumbnail)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        self.get_book(id)
            .await?
            .ok_or_else(|| AppError::Database("Book row missing after update".to_string()))
    }

    pub async fn delete_book(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM books WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected() > 0)
    }

    // ─── Reading List Operations ─────────────────────────────────
    //
    // Every query is scoped to the owning user: an entry belonging to
    // someone else reads as absent.

    pub async fn list_reading_list(
        &self,
        user_id: i64,
        query: &ReadingListQuery,
    ) -> Result<Vec<ReadingListDetail>, AppError> {
        let mut builder = QueryBuilder::new(format!(
            "SELECT r.id AS r_id, r.user_id AS r_user_id, r.position AS r_position, \
             r.date_added AS r_date_added, {BOOK_COLUMNS} \
             FROM reading_list r \
             JOIN books b ON b.id = r.book_id \
             JOIN authors a ON a.id = b.author_id \
             JOIN genres g ON g.id = b.genre_id \
             WHERE r.user_id = "
        ));
        builder.push_bind(user_id);

        if let Some(title) = &query.book_title {
            builder.push(" AND b.title = ").push_bind(title.clone());
        }
        if let Some(search) = &query.search {
            let pattern = format!("%{}%", search);
            builder
                .push(" AND (b.title LIKE ")
                .push_bind(pattern.clone())
                .push(" OR a.first_name LIKE ")
                .push_bind(pattern.clone())
                .push(" OR a.last_name LIKE ")
                .push_bind(pattern)
                .push(")");
        }

        builder
            .push(" ORDER BY ")
            .push(reading_list_order(query.ordering.as_deref()));

        let rows = builder.build().fetch_all(&self.pool).await.map_err(db_err)?;
        rows.iter()
            .map(reading_list_from_row)
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .map_err(db_err)
    }

    pub async fn get_reading_list_entry(
        &self,
        user_id: i64,
        id: i64,
    ) -> Result<Option<ReadingListDetail>, AppError> {
        let sql = format!(
            "SELECT r.id AS r_id, r.user_id AS r_user_id, r.position AS r_position, \
             r.date_added AS r_date_added, {BOOK_COLUMNS} \
             FROM reading_list r \
             JOIN books b ON b.id = r.book_id \
             JOIN authors a ON a.id = b.author_id \
             JOIN genres g ON g.id = b.genre_id \
             WHERE r.user_id = ? AND r.id = ?"
        );
        let row = sqlx::query(&sql)
            .bind(user_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        row.as_ref()
            .map(reading_list_from_row)
            .transpose()
            .map_err(db_err)
    }

    pub async fn create_reading_list_entry(
        &self,
        user_id: i64,
        write: &ReadingListWrite,
    ) -> Result<ReadingListDetail, AppError> {
        let result = sqlx::query(
            "INSERT INTO reading_list (user_id, book_id, position, date_added) \
             VALUES (?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(write.book_id)
        .bind(write.position)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(map_reading_list_unique)?;

        self.get_reading_list_entry(user_id, result.last_insert_rowid())
            .await?
            .ok_or_else(|| {
                AppError::Database("Reading list row missing after insert".to_string())
            })
    }

    pub async fn update_reading_list_entry(
        &self,
        user_id: i64,
        id: i64,
        write: &ReadingListWrite,
    ) -> Result<ReadingListDetail, AppError> {
        sqlx::query(
            "UPDATE reading_list SET book_id = ?, position = ? WHERE id = ? AND user_id = ?",
        )
        .bind(write.book_id)
        .bind(write.position)
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(map_reading_list_unique)?;

        self.get_reading_list_entry(user_id, id)
            .await?
            .ok_or_else(|| {
                AppError::Database("Reading list row missing after update".to_string())
            })
    }

    pub async fn delete_reading_list_entry(
        &self,
        user_id: i64,
        id: i64,
    ) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM reading_list WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(result.rows_affected() > 0)
    }
}

// ─── Row Mapping & Error Helpers ─────────────────────────────────

fn book_detail_from_row(row: &SqliteRow) -> Result<BookDetail, sqlx::Error> {
    let author = Author {
        id: row.try_get("a_id")?,
        first_name: row.try_get("a_first_name")?,
        last_name: row.try_get("a_last_name")?,
        date_of_birth: row.try_get("a_date_of_birth")?,
        date_of_death: row.try_get("a_date_of_death")?,
        created_by: row.try_get("a_created_by")?,
    };
    let genre = Genre {
        id: row.try_get("g_id")?,
        name: row.try_get("g_name")?,
    };

    Ok(BookDetail {
        id: row.try_get("b_id")?,
        title: row.try_get("b_title")?,
        subtitle: row.try_get("b_subtitle")?,
        book_url: row.try_get("b_book_url")?,
        language: row.try_get("b_language")?,
        description: row.try_get("b_description")?,
        publication_date: row.try_get("b_publication_date")?,
        thumbnail: row.try_get("b_thumbnail")?,
        author: author.into(),
        genre,
        created_by: row.try_get("b_created_by")?,
    })
}

fn reading_list_from_row(row: &SqliteRow) -> Result<ReadingListDetail, sqlx::Error> {
    Ok(ReadingListDetail {
        id: row.try_get("r_id")?,
        user_id: row.try_get("r_user_id")?,
        position: row.try_get("r_position")?,
        date_added: row.try_get("r_date_added")?,
        book: book_detail_from_row(row)?,
    })
}

/// Ordering whitelist for book listings; unknown keys fall back to the
/// default of newest first.
fn book_order(ordering: Option<&str>) -> &'static str {
    match ordering {
        Some("title") => "b.title",
        Some("-title") => "b.title DESC",
        Some("publication_date") => "b.publication_date",
        Some("-publication_date") => "b.publication_date DESC",
        Some("created_at") => "b.created_at",
        _ => "b.created_at DESC",
    }
}

/// Ordering whitelist for reading list listings.
fn reading_list_order(ordering: Option<&str>) -> &'static str {
    match ordering {
        Some("position") => "r.position",
        Some("-position") => "r.position DESC",
        Some("date_added") => "r.date_added",
        Some("-date_added") => "r.date_added DESC",
        _ => "r.position, r.date_added DESC",
    }
}

fn db_err(e: sqlx::Error) -> AppError {
    AppError::Database(e.to_string())
}

fn unique_violation(e: &sqlx::Error, constraint: &str) -> bool {
    e.as_database_error()
        .is_some_and(|d| d.is_unique_violation() && d.message().contains(constraint))
}

/// SQLite reports child-side FK violations with one extended code and
/// parent-side RESTRICT violations with another, so match on the message
/// as well.
fn foreign_key_violation(e: &sqlx::Error) -> bool {
    e.as_database_error().is_some_and(|d| {
        d.is_foreign_key_violation() || d.message().contains("FOREIGN KEY constraint failed")
    })
}

fn map_author_unique(e: sqlx::Error) -> AppError {
    if unique_violation(&e, "authors.first_name") {
        AppError::validation(
            "non_field_errors",
            "An author with this name already exists.",
        )
    } else {
        db_err(e)
    }
}

fn map_genre_unique(e: sqlx::Error) -> AppError {
    if unique_violation(&e, "genres.name") {
        AppError::validation("name", "A genre with this name already exists.")
    } else {
        db_err(e)
    }
}

fn map_reading_list_unique(e: sqlx::Error) -> AppError {
    if unique_violation(&e, "reading_list.user_id") {
        AppError::validation("book_id", "This book is already in your reading list.")
    } else {
        db_err(e)
    }
}
