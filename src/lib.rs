// SPDX-License-Identifier: MIT

//! Bookshelf: library-management API backend
//!
//! This crate provides JWT-authenticated CRUD for books, authors, genres
//! and per-user reading lists, with an account-blocking rule layered on
//! top of standard token issuance and refresh.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod permissions;
pub mod routes;
pub mod services;

use config::Config;
use db::SqliteDb;
use services::TokenService;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: SqliteDb,
    pub tokens: TokenService,
}
