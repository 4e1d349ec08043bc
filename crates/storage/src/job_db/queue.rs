// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job Queue operations (`spec.md` §4.1): submission, atomic claim,
//! status transitions, cancellation, the hung-job sweep, and the
//! output-level dedup cache workers consult before re-running a job
//! whose `(output_file, content_hash)` is already known done.

use super::JobDb;
use crate::error::StorageError;
use crate::retry::with_retry;
use crate::sqlite::{begin_immediate, now_ms};
use clxo_core::{
    Job, JobId, JobResult, JobStatus, JobType, NewJob, RetentionPolicy, RetryPolicy, WorkerId,
};
use sqlx::Row;
use std::collections::HashMap;

/// A status snapshot as returned by the batch poll the Backend uses
/// while waiting on a set of submitted jobs (`spec.md` §4.4).
#[derive(Debug, Clone)]
pub struct JobStatusSnapshot {
    pub status: JobStatus,
    pub error: Option<String>,
    pub result: Option<JobResult>,
}

#[derive(Debug, Clone, Default)]
pub struct CleanupReport {
    pub jobs_deleted: u64,
    pub events_deleted: u64,
}

fn row_to_job(row: &sqlx::sqlite::SqliteRow) -> Result<Job, StorageError> {
    let job_type_s: String = row.try_get("job_type").map_err(StorageError::from)?;
    let status_s: String = row.try_get("status").map_err(StorageError::from)?;
    let payload_blob: String = row.try_get("payload_blob").map_err(StorageError::from)?;
    let result_blob: Option<String> = row.try_get("result_blob").map_err(StorageError::from)?;
    let worker_id: Option<String> = row.try_get("worker_id").map_err(StorageError::from)?;

    let job_type = JobType::from_str(&job_type_s)
        .ok_or_else(|| StorageError::Integrity(format!("unknown job_type {job_type_s}")))?;
    let status = JobStatus::from_str(&status_s)
        .ok_or_else(|| StorageError::Integrity(format!("unknown status {status_s}")))?;
    let payload = serde_json::from_str(&payload_blob)?;
    let result = result_blob.map(|b| serde_json::from_str(&b)).transpose()?;

    Ok(Job {
        id: JobId::from_string(row.try_get::<String, _>("id").map_err(StorageError::from)?),
        job_type,
        input_file: row.try_get("input_file").map_err(StorageError::from)?,
        output_file: row.try_get("output_file").map_err(StorageError::from)?,
        content_hash: row.try_get("content_hash").map_err(StorageError::from)?,
        payload,
        status,
        worker_id: worker_id.map(WorkerId::from_string),
        correlation_id: clxo_core::CorrelationId::from_string(
            row.try_get::<String, _>("correlation_id")
                .map_err(StorageError::from)?,
        ),
        created_at_ms: row.try_get::<i64, _>("created_at_ms").map_err(StorageError::from)? as u64,
        started_at_ms: row
            .try_get::<Option<i64>, _>("started_at_ms")
            .map_err(StorageError::from)?
            .map(|v| v as u64),
        completed_at_ms: row
            .try_get::<Option<i64>, _>("completed_at_ms")
            .map_err(StorageError::from)?
            .map(|v| v as u64),
        error: row.try_get("error").map_err(StorageError::from)?,
        result,
        cancelled_by: row.try_get("cancelled_by").map_err(StorageError::from)?,
        retry_count: row.try_get::<i64, _>("retry_count").map_err(StorageError::from)? as u32,
    })
}

impl JobDb {
    /// Submit a new job in `pending` status. Returns the assigned id.
    pub async fn add_job(&self, req: NewJob) -> Result<JobId, StorageError> {
        let id = JobId::new();
        let payload_blob = serde_json::to_string(&req.payload)?;
        let now = now_ms();

        with_retry(RetryPolicy::database_busy(), || async {
            sqlx::query(
                "INSERT INTO jobs
                    (id, job_type, input_file, output_file, content_hash, payload_blob,
                     status, worker_id, correlation_id, created_at_ms, retry_count)
                 VALUES (?, ?, ?, ?, ?, ?, 'pending', NULL, ?, ?, 0)",
            )
            .bind(id.as_str())
            .bind(req.job_type.as_str())
            .bind(&req.input_file)
            .bind(&req.output_file)
            .bind(&req.content_hash)
            .bind(&payload_blob)
            .bind(req.correlation_id.as_str())
            .bind(now as i64)
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
            Ok(())
        })
        .await?;

        Ok(id)
    }

    /// Atomically claim the oldest pending job of `job_type`, assigning
    /// it to `worker_id` and transitioning it to `processing`. Exactly
    /// one caller observes a given job id returned from this method —
    /// enforced by the `BEGIN IMMEDIATE` write lock, not by application
    /// logic (`spec.md` §4.1, §8: "exactly-one-claimer").
    pub async fn get_next_job(
        &self,
        job_type: JobType,
        worker_id: &WorkerId,
    ) -> Result<Option<Job>, StorageError> {
        with_retry(RetryPolicy::database_busy(), || async {
            let mut tx = begin_immediate(&self.pool).await?;

            let row = sqlx::query(
                "SELECT * FROM jobs WHERE status = 'pending' AND job_type = ?
                 ORDER BY created_at_ms ASC LIMIT 1",
            )
            .bind(job_type.as_str())
            .fetch_optional(&mut *tx)
            .await
            .map_err(StorageError::from)?;

            let Some(row) = row else {
                tx.commit().await.map_err(StorageError::from)?;
                return Ok(None);
            };

            let mut job = row_to_job(&row)?;
            let now = now_ms();

            sqlx::query(
                "UPDATE jobs SET status = 'processing', worker_id = ?, started_at_ms = ?
                 WHERE id = ? AND status = 'pending'",
            )
            .bind(worker_id.as_str())
            .bind(now as i64)
            .bind(job.id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(StorageError::from)?;

            tx.commit().await.map_err(StorageError::from)?;

            job.status = JobStatus::Processing;
            job.worker_id = Some(*worker_id);
            job.started_at_ms = Some(now);
            Ok(Some(job))
        })
        .await
    }

    /// Transition a job to a terminal or processing status. Rejects the
    /// transition (without changing anything) if the job is already in
    /// a terminal status — terminal states are final (`spec.md` §3).
    pub async fn update_job_status(
        &self,
        id: &JobId,
        status: JobStatus,
        error: Option<&str>,
        result: Option<&JobResult>,
    ) -> Result<(), StorageError> {
        let result_blob = result.map(serde_json::to_string).transpose()?;
        let now = now_ms();
        let id = *id;

        with_retry(RetryPolicy::database_busy(), || async {
            let mut tx = begin_immediate(&self.pool).await?;

            let current: Option<String> =
                sqlx::query_scalar("SELECT status FROM jobs WHERE id = ?")
                    .bind(id.as_str())
                    .fetch_optional(&mut *tx)
                    .await
                    .map_err(StorageError::from)?;

            let Some(current) = current else {
                return Err(StorageError::JobNotFound(id.as_str().to_string()));
            };
            let current_status = JobStatus::from_str(&current)
                .ok_or_else(|| StorageError::Integrity(format!("unknown status {current}")))?;

            if current_status.is_terminal() {
                return Err(StorageError::TerminalTransition(
                    id.as_str().to_string(),
                    current_status.as_str(),
                    status.as_str(),
                ));
            }

            let completed_at = if status.is_terminal() {
                Some(now as i64)
            } else {
                None
            };

            sqlx::query(
                "UPDATE jobs SET status = ?, error = ?, result_blob = ?, completed_at_ms = COALESCE(?, completed_at_ms)
                 WHERE id = ?",
            )
            .bind(status.as_str())
            .bind(error)
            .bind(&result_blob)
            .bind(completed_at)
            .bind(id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(StorageError::from)?;

            tx.commit().await.map_err(StorageError::from)?;
            Ok(())
        })
        .await
    }

    /// Batch status poll (`spec.md` §4.4's completion wait loop polls
    /// many jobs per tick rather than one row at a time).
    pub async fn get_job_statuses_batch(
        &self,
        ids: &[JobId],
    ) -> Result<HashMap<JobId, JobStatusSnapshot>, StorageError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let placeholders = std::iter::repeat("?")
            .take(ids.len())
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "SELECT id, status, error, result_blob FROM jobs WHERE id IN ({placeholders})"
        );

        with_retry(RetryPolicy::database_busy(), || async {
            let mut q = sqlx::query(&sql);
            for id in ids {
                q = q.bind(id.as_str());
            }
            let rows = q.fetch_all(&self.pool).await.map_err(StorageError::from)?;

            let mut out = HashMap::with_capacity(rows.len());
            for row in rows {
                let id: String = row.try_get("id").map_err(StorageError::from)?;
                let status_s: String = row.try_get("status").map_err(StorageError::from)?;
                let error: Option<String> = row.try_get("error").map_err(StorageError::from)?;
                let result_blob: Option<String> =
                    row.try_get("result_blob").map_err(StorageError::from)?;
                let status = JobStatus::from_str(&status_s)
                    .ok_or_else(|| StorageError::Integrity(format!("unknown status {status_s}")))?;
                let result = result_blob.map(|b| serde_json::from_str(&b)).transpose()?;
                out.insert(
                    JobId::from_string(id),
                    JobStatusSnapshot {
                        status,
                        error,
                        result,
                    },
                );
            }
            Ok(out)
        })
        .await
    }

    pub async fn is_job_cancelled(&self, id: &JobId) -> Result<bool, StorageError> {
        let status: Option<String> =
            sqlx::query_scalar("SELECT status FROM jobs WHERE id = ?")
                .bind(id.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(StorageError::from)?;
        Ok(status.as_deref() == Some("cancelled"))
    }

    /// Cancel every non-terminal job queued against `input_file` (watch
    /// mode's stale-rebuild cancellation, `spec.md` §4.4, §8). Idempotent:
    /// jobs already terminal are left untouched.
    pub async fn cancel_jobs_for_file(
        &self,
        input_file: &str,
        reason: &str,
    ) -> Result<Vec<JobId>, StorageError> {
        let input_file = input_file.to_string();
        let reason = reason.to_string();

        with_retry(RetryPolicy::database_busy(), || async {
            let mut tx = begin_immediate(&self.pool).await?;

            let rows = sqlx::query(
                "SELECT id FROM jobs WHERE input_file = ?
                 AND status NOT IN ('completed', 'failed', 'cancelled')",
            )
            .bind(&input_file)
            .fetch_all(&mut *tx)
            .await
            .map_err(StorageError::from)?;

            let ids: Vec<JobId> = rows
                .iter()
                .map(|r| r.try_get::<String, _>("id").map(JobId::from_string))
                .collect::<Result<_, _>>()
                .map_err(StorageError::from)?;

            for id in &ids {
                sqlx::query(
                    "UPDATE jobs SET status = 'cancelled', cancelled_by = ?, completed_at_ms = ?
                     WHERE id = ?",
                )
                .bind(&reason)
                .bind(now_ms() as i64)
                .bind(id.as_str())
                .execute(&mut *tx)
                .await
                .map_err(StorageError::from)?;
            }

            tx.commit().await.map_err(StorageError::from)?;
            Ok(ids)
        })
        .await
    }

    /// Reset jobs claimed by workers the Pool Manager has declared dead
    /// or hung back to `pending`, freeing them for redispatch and
    /// bumping `retry_count` (`spec.md` §4.3's hang-detection sweep).
    pub async fn reset_hung_jobs(&self, dead_worker_ids: &[WorkerId]) -> Result<u64, StorageError> {
        if dead_worker_ids.is_empty() {
            return Ok(0);
        }
        let placeholders = std::iter::repeat("?")
            .take(dead_worker_ids.len())
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE jobs SET status = 'pending', worker_id = NULL, started_at_ms = NULL,
                retry_count = retry_count + 1
             WHERE status = 'processing' AND worker_id IN ({placeholders})"
        );

        with_retry(RetryPolicy::database_busy(), || async {
            let mut q = sqlx::query(&sql);
            for id in dead_worker_ids {
                q = q.bind(id.as_str());
            }
            let result = q.execute(&self.pool).await.map_err(StorageError::from)?;
            Ok(result.rows_affected())
        })
        .await
    }

    /// Whether `(output_file, content_hash)` has already been produced by
    /// some job, regardless of which input file it came from — the
    /// output-level dedup cache a worker consults before redoing work a
    /// sibling job already did (`spec.md` §4.1).
    pub async fn check_cache(&self, output_file: &str, content_hash: &str) -> Result<bool, StorageError> {
        let row: Option<i64> = sqlx::query_scalar(
            "SELECT 1 FROM job_cache WHERE output_file = ? AND content_hash = ?",
        )
        .bind(output_file)
        .bind(content_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(StorageError::from)?;
        Ok(row.is_some())
    }

    pub async fn add_to_cache(
        &self,
        output_file: &str,
        content_hash: &str,
        metadata: &str,
    ) -> Result<(), StorageError> {
        with_retry(RetryPolicy::database_busy(), || async {
            sqlx::query(
                "INSERT INTO job_cache (output_file, content_hash, metadata_blob, stored_at_ms)
                 VALUES (?, ?, ?, ?)
                 ON CONFLICT (output_file, content_hash) DO UPDATE SET
                    metadata_blob = excluded.metadata_blob, stored_at_ms = excluded.stored_at_ms",
            )
            .bind(output_file)
            .bind(content_hash)
            .bind(metadata)
            .bind(now_ms() as i64)
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?;
            Ok(())
        })
        .await
    }

    /// Apply the configured retention windows (`spec.md` §4.1): prune
    /// terminal jobs and worker events older than their respective
    /// windows.
    pub async fn cleanup_all(&self, retention: RetentionPolicy) -> Result<CleanupReport, StorageError> {
        let now = now_ms() as i64;
        let day_ms = 86_400_000i64;

        let completed_cutoff = now - retention.completed_days as i64 * day_ms;
        let failed_cutoff = now - retention.failed_days as i64 * day_ms;
        let cancelled_cutoff = now - retention.cancelled_days as i64 * day_ms;
        let events_cutoff = now - retention.events_days as i64 * day_ms;

        let jobs_deleted = sqlx::query(
            "DELETE FROM jobs WHERE
                (status = 'completed' AND completed_at_ms < ?) OR
                (status = 'failed' AND completed_at_ms < ?) OR
                (status = 'cancelled' AND completed_at_ms < ?)",
        )
        .bind(completed_cutoff)
        .bind(failed_cutoff)
        .bind(cancelled_cutoff)
        .execute(&self.pool)
        .await
        .map_err(StorageError::from)?
        .rows_affected();

        let events_deleted = sqlx::query("DELETE FROM worker_events WHERE at_ms < ?")
            .bind(events_cutoff)
            .execute(&self.pool)
            .await
            .map_err(StorageError::from)?
            .rows_affected();

        Ok(CleanupReport {
            jobs_deleted,
            events_deleted,
        })
    }
}
