// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared SQLite connection setup (`spec.md` §5: "the database driver is
//! configured for high contention — WAL mode, long busy-timeout,
//! immediate transactions where write-after-read is needed").

use crate::error::StorageError;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Acquire, SqlitePool};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Open (creating if absent) a SQLite database with WAL journaling and a
/// generous busy timeout, and run the given embedded migrations.
pub async fn open_sqlite_pool(
    path: &Path,
    migrator: &sqlx::migrate::Migrator,
) -> Result<SqlitePool, StorageError> {
    let url = format!("sqlite://{}", path.display());
    let options = SqliteConnectOptions::from_str(&url)
        .map_err(StorageError::from)?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_secs(5))
        .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);

    let pool = SqlitePoolOptions::new()
        .max_connections(16)
        .connect_with(options)
        .await
        .map_err(StorageError::from)?;

    migrator.run(&pool).await.map_err(StorageError::from)?;

    Ok(pool)
}

/// Begin a `BEGIN IMMEDIATE` transaction instead of the deferred `BEGIN`
/// `sqlx::Pool::begin` issues. Deferred transactions upgrade to a write
/// lock lazily on the first write, which is exactly the pattern that
/// lets two concurrent readers-then-writers deadlock each other;
/// `get_next_job`'s claim (§4.1) needs the write lock up front. Returns
/// an ordinary `sqlx::Transaction`, so the usual commit-or-drop-rolls-
/// back behavior still applies.
pub async fn begin_immediate(
    pool: &SqlitePool,
) -> Result<sqlx::Transaction<'static, sqlx::Sqlite>, StorageError> {
    // Pool is a cheap Arc clone; cloning is what lets the returned
    // transaction outlive this function's borrow of `pool`.
    pool.clone()
        .begin_with("BEGIN IMMEDIATE")
        .await
        .map_err(StorageError::from)
}

pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
