// SPDX-License-Identifier: MIT

//! Bookshelf API Server
//!
//! Library-management backend: authenticated CRUD for books, authors,
//! genres and reading lists, with blocked-account token denial.

use bookshelf::{config::Config, db::SqliteDb, services::TokenService, AppState};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting Bookshelf API");

    // Open the database and run pending migrations
    let db = SqliteDb::connect(&config.database_url)
        .await
        .expect("Failed to open database");
    tracing::info!(database_url = %config.database_url, "Database ready");

    let tokens = TokenService::new(&config);

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        tokens,
    });

    // Build router
    let app = bookshelf::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("bookshelf=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
