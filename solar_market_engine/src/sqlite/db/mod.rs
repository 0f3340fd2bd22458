//! # SQLite Database methods
//!
//! This module contains "low-level" SQLite database interactions.
//!
//! All these interactions are plain functions that accept a `&mut SqliteConnection` argument. Callers can obtain a
//! connection from a pool, or open a transaction and pass `&mut tx` through, without any other changes.
use std::env;

use log::info;
use sqlx::{sqlite::SqlitePoolOptions, Error as SqlxError, SqlitePool};

pub mod callbacks;
pub mod carts;
pub mod orders;
pub mod products;
pub mod profiles;
pub mod tickets;
pub mod users;

const SQLITE_DB_URL: &str = "sqlite://data/solar_market.db?mode=rwc";

pub fn db_url() -> String {
    let result = env::var("SLM_DATABASE_URL").unwrap_or_else(|_| {
        info!("🗃️ SLM_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("🗃️ Using database URL: {result}");
    result
}

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqlxError> {
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect(url).await?;
    Ok(pool)
}

/// True if the error is a UNIQUE constraint violation.
pub(crate) fn is_unique_violation(e: &SqlxError) -> bool {
    matches!(e, SqlxError::Database(db) if db.is_unique_violation())
}
