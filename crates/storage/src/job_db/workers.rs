// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker registry operations (`spec.md` §4.3): registration, heartbeat,
//! status, and the staleness query the Pool Manager's health monitor
//! polls on its 10s interval.

use super::JobDb;
use crate::error::StorageError;
use crate::retry::with_retry;
use crate::sqlite::now_ms;
use clxo_core::{ExecutionMode, JobType, RetryPolicy, Worker, WorkerId, WorkerStatus};
use sqlx::Row;

fn row_to_worker(row: &sqlx::sqlite::SqliteRow) -> Result<Worker, StorageError> {
    let worker_type_s: String = row.try_get("worker_type").map_err(StorageError::from)?;
    let status_s: String = row.try_get("status").map_err(StorageError::from)?;
    let mode_s: String = row.try_get("execution_mode").map_err(StorageError::from)?;

    Ok(Worker {
        id: WorkerId::from_string(row.try_get::<String, _>("id").map_err(StorageError::from)?),
        worker_type: JobType::from_str(&worker_type_s)
            .ok_or_else(|| StorageError::Integrity(format!("unknown job_type {worker_type_s}")))?,
        executor_id: row.try_get("executor_id").map_err(StorageError::from)?,
        status: WorkerStatus::from_str(&status_s)
            .ok_or_else(|| StorageError::Integrity(format!("unknown worker status {status_s}")))?,
        last_heartbeat_ms: row
            .try_get::<i64, _>("last_heartbeat_ms")
            .map_err(StorageError::from)? as u64,
        started_at_ms: row.try_get::<i64, _>("started_at_ms").map_err(StorageError::from)? as u64,
        jobs_processed: row
            .try_get::<i64, _>("jobs_processed")
            .map_err(StorageError::from)? as u64,
        jobs_failed: row.try_get::<i64, _>("jobs_failed").map_err(StorageError::from)? as u64,
        execution_mode: ExecutionMode::from_str(&mode_s)
            .ok_or_else(|| StorageError::Integrity(format!("unknown execution_mode {mode_s}")))?,
        host_path_prefix: row.try_get("host_path_prefix").map_err(StorageError::from)?,
        container_path_prefix: row
            .try_get("container_path_prefix")
            .map_err(StorageError::from)?,
    })
}

impl JobDb {
    pub async fn register_worker(&self, worker: &Worker) -> Result<(), StorageError> {
        with_retry(RetryPolicy::database_busy(), || async {
            sqlx::query(
                "INSERT INTO workers
                    (id, worker_type, executor_id, status, last_heartbeat_ms, started_at_ms,
                     jobs_processed, jobs_failed, execution_mode, host_path_prefix, container_path_prefix)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(worker.id.as_str())
            .bind(worker.worker_type.as_str())
            .bind(&worker.executor_id)
            .bind(worker.status.as_str())
            .bind(worker.last_heartbeat_ms as i64)
            .bind(worker.started_at_ms as i64)
            .bind(worker.jobs_processed as i64)
            .bind(worker.jobs_failed as i64)
            .bind(worker.execution_mode.as_str())
            .bind(&worker.host_path_prefix)
            .bind(&worker.container_path_prefix)
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
            Ok(())
        })
        .await
    }

    /// Record a liveness heartbeat and the worker's self-reported status.
    /// Called on every poll tick of the worker loop (`spec.md` §4.3).
    pub async fn heartbeat(&self, id: &WorkerId, status: WorkerStatus) -> Result<(), StorageError> {
        with_retry(RetryPolicy::database_busy(), || async {
            sqlx::query(
                "UPDATE workers SET last_heartbeat_ms = ?, status = ? WHERE id = ?",
            )
            .bind(now_ms() as i64)
            .bind(status.as_str())
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
            Ok(())
        })
        .await
    }

    pub async fn mark_worker_status(
        &self,
        id: &WorkerId,
        status: WorkerStatus,
    ) -> Result<(), StorageError> {
        with_retry(RetryPolicy::database_busy(), || async {
            sqlx::query("UPDATE workers SET status = ? WHERE id = ?")
                .bind(status.as_str())
                .bind(id.as_str())
                .execute(&self.pool)
                .await
                .map_err(StorageError::from)?;
            Ok(())
        })
        .await
    }

    /// Bump the completion counters after a job finishes under this
    /// worker — `failed` also counts toward `jobs_processed`.
    pub async fn record_job_outcome(&self, id: &WorkerId, failed: bool) -> Result<(), StorageError> {
        with_retry(RetryPolicy::database_busy(), || async {
            sqlx::query(
                "UPDATE workers SET jobs_processed = jobs_processed + 1,
                    jobs_failed = jobs_failed + ? WHERE id = ?",
            )
            .bind(if failed { 1 } else { 0 })
            .bind(id.as_str())
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
            Ok(())
        })
        .await
    }

    pub async fn get_worker(&self, id: &WorkerId) -> Result<Option<Worker>, StorageError> {
        let row = sqlx::query("SELECT * FROM workers WHERE id = ?")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::from)?;
        row.as_ref().map(row_to_worker).transpose()
    }

    pub async fn list_workers(&self, job_type: Option<JobType>) -> Result<Vec<Worker>, StorageError> {
        let rows = match job_type {
            Some(jt) => sqlx::query("SELECT * FROM workers WHERE worker_type = ?")
                .bind(jt.as_str())
                .fetch_all(&self.pool)
                .await
                .map_err(StorageError::from)?,
            None => sqlx::query("SELECT * FROM workers")
                .fetch_all(&self.pool)
                .await
                .map_err(StorageError::from)?,
        };
        rows.iter().map(row_to_worker).collect()
    }

    /// Workers whose last heartbeat predates `now - staleness_ms` — the
    /// candidate set the health monitor treats as `hung`/`dead`
    /// (`spec.md` §4.3, 30s default staleness threshold).
    pub async fn stale_workers(&self, staleness_ms: u64) -> Result<Vec<Worker>, StorageError> {
        let cutoff = now_ms().saturating_sub(staleness_ms) as i64;
        let rows = sqlx::query("SELECT * FROM workers WHERE last_heartbeat_ms < ?")
            .bind(cutoff)
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::from)?;
        rows.iter().map(row_to_worker).collect()
    }

    pub async fn remove_worker(&self, id: &WorkerId) -> Result<(), StorageError> {
        with_retry(RetryPolicy::database_busy(), || async {
            sqlx::query("DELETE FROM workers WHERE id = ?")
                .bind(id.as_str())
                .execute(&self.pool)
                .await
                .map_err(StorageError::from)?;
            Ok(())
        })
        .await
    }
}

#[cfg(test)]
#[path = "workers_tests.rs"]
mod tests;
