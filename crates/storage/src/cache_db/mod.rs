// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Cache DB: the Result Cache, the issue/warning log, and the
//! executed-notebook cache (`spec.md` §4.2, §6).

mod executed_notebooks;
mod issues;
mod results;

pub use issues::CachedIssue;
pub use results::GetResultKey;

use crate::error::StorageError;
use crate::sqlite::open_sqlite_pool;
use sqlx::SqlitePool;
use std::path::Path;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("migrations/cache_db");

/// Owns the result cache, the stored-issue log, and the executed-notebook
/// cache — kept in a separate file from the Job DB so a full cache wipe
/// never disturbs in-flight queue state (`spec.md` §6).
#[derive(Debug)]
pub struct CacheDb {
    pool: SqlitePool,
}

impl CacheDb {
    pub async fn open(path: &Path) -> Result<Self, StorageError> {
        let pool = open_sqlite_pool(path, &MIGRATOR).await?;
        Ok(Self { pool })
    }

    #[cfg(any(test, feature = "test-support"))]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Apply the configured retention windows: drop result versions past
    /// `result_versions` per key and issues older than `issues_days`
    /// (`spec.md` §4.2).
    pub async fn cleanup_all(
        &self,
        retention: clxo_core::RetentionPolicy,
    ) -> Result<CacheCleanupReport, StorageError> {
        let issues_deleted = self.prune_stale_issues(retention.issues_days).await?;
        let results_deleted = self.prune_excess_result_versions(retention.result_versions).await?;
        Ok(CacheCleanupReport {
            issues_deleted,
            results_deleted,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct CacheCleanupReport {
    pub issues_deleted: u64,
    pub results_deleted: u64,
}

#[cfg(test)]
#[path = "cache_db_tests.rs"]
mod tests;
