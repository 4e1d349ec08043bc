// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Storage error taxonomy.
//!
//! `Busy` is retried internally by [`crate::retry`] before ever reaching
//! a caller; `Integrity` (constraint violations, foreign-key/uniqueness
//! breaks) and `Migration` are fatal and surface immediately, per
//! `spec.md` §4.1's failure semantics.

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("database busy, exhausted retry budget: {0}")]
    Busy(String),

    #[error("integrity violation: {0}")]
    Integrity(String),

    #[error("migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("serialization failed: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Db(sqlx::Error),

    #[error("no such job: {0}")]
    JobNotFound(String),

    #[error("cannot transition terminal job {0} ({1} -> {2})")]
    TerminalTransition(String, &'static str, &'static str),
}

impl From<sqlx::Error> for StorageError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db_err) => {
                if let Some(code) = db_err.code() {
                    // SQLite: 5 = SQLITE_BUSY, 6 = SQLITE_LOCKED
                    if code == "5" || code == "6" {
                        return StorageError::Busy(db_err.message().to_string());
                    }
                }
                StorageError::Integrity(db_err.message().to_string())
            }
            _ => StorageError::Db(e),
        }
    }
}

impl StorageError {
    /// Whether this error is the kind the retry loop in
    /// [`crate::retry::with_retry`] should retry, versus surface
    /// immediately (`spec.md` §4.1: "deadlock or integrity violations
    /// are fatal and surface immediately").
    pub fn is_retryable(&self) -> bool {
        matches!(self, StorageError::Busy(_))
    }
}
