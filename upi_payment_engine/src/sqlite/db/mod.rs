//! # SQLite Database methods
//!
//! This module contains "low-level" SQLite database interactions.
//!
//! All these interaction are maintained by simple functions (rather than stateful structs) that accept a
//! `&mut SqliteConnection` argument. Callers can obtain a connection from a pool,
//! or create an atomic transaction as the need arises and call through to the functions without any other changes.
//!
//! Queries are always stepped to completion (`fetch_all`, `execute`), including single-row lookups. SQLite only
//! finishes an autocommit statement when it runs to the end or is reset, and a pooled connection holding a
//! half-stepped statement keeps its write uncommitted, or its read lock held, until it is next used.
use std::{env, str::FromStr};

use log::info;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Error as SqlxError,
    SqlitePool,
};

pub mod orders;
pub mod settings;
pub mod transactions;
pub mod unmapped;

const SQLITE_DB_URL: &str = "sqlite://data/upi_gateway.db";

pub fn db_url() -> String {
    let result = env::var("UPG_DATABASE_URL").unwrap_or_else(|_| {
        info!("🗃️ UPG_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("🗃️ Using database URL: {result}");
    result
}

/// Opens a connection pool, creating the database file if it does not exist yet.
pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, SqlxError> {
    let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
    Ok(pool)
}

/// Maps a unique-constraint violation to `on_conflict`, and passes every other error through unchanged.
pub(crate) fn map_unique_violation<E>(e: SqlxError, on_conflict: impl FnOnce() -> E) -> E
where E: From<SqlxError> {
    match e {
        SqlxError::Database(ref err) if err.is_unique_violation() => on_conflict(),
        e => E::from(e),
    }
}
