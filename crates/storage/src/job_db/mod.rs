// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Job DB: queue + worker registry (`spec.md` §4.1, §4.3).

mod events;
mod queue;
mod workers;

pub use events::WorkerEvent;
pub use queue::{CleanupReport, JobStatusSnapshot};

use crate::error::StorageError;
use crate::sqlite::open_sqlite_pool;
use sqlx::SqlitePool;
use std::path::Path;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("migrations/job_db");

/// Owns the job queue and the worker registry. A single `SqlitePool`
/// backed by one file — the Cache DB is always a separate file (`spec.md`
/// §6) so the two stores can be wiped independently.
pub struct JobDb {
    pool: SqlitePool,
}

impl JobDb {
    pub async fn open(path: &Path) -> Result<Self, StorageError> {
        let pool = open_sqlite_pool(path, &MIGRATOR).await?;
        Ok(Self { pool })
    }

    #[cfg(any(test, feature = "test-support"))]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod queue_tests;
