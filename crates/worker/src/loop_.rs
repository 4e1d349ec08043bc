// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The worker base loop (`spec.md` §4.4): register, then repeatedly
//! poll/claim/cancel-check/handle/write-atomically/mark-terminal/
//! heartbeat, until a `SIGTERM` marks this worker `dead` and exits.

use crate::error::WorkerError;
use crate::handler::{HandlerContext, HandlerError, JobHandler};
use clxo_core::{Job, JobResult, JobStatus, RetryPolicy, Worker, WorkerStatus};
use clxo_storage::JobDb;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Same jitter technique as `clxo_storage::retry` — derived from the
/// monotonic clock, not cryptographic, only needed so every idle worker
/// doesn't wake on the same tick.
fn jitter_sample() -> f64 {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    ((nanos % 2000) as f64 / 1000.0) - 1.0
}

/// Empty-poll sleep, jittered between 100ms and 500ms (`spec.md` §4.4).
fn empty_poll_sleep() -> Duration {
    let base = Duration::from_millis(100);
    let span = Duration::from_millis(400);
    let t = (jitter_sample() + 1.0) / 2.0; // remap [-1,1] -> [0,1]
    base + Duration::from_millis((span.as_millis() as f64 * t) as u64)
}

async fn write_output_atomically(output_file: &Path, bytes: &[u8]) -> Result<(), WorkerError> {
    let parent = output_file.parent().unwrap_or_else(|| Path::new("."));
    tokio::fs::create_dir_all(parent).await.map_err(WorkerError::Io)?;
    let tmp_path = parent.join(format!(
        ".{}.tmp-{}",
        output_file
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("output"),
        clxo_core::CorrelationId::new().suffix(),
    ));
    tokio::fs::write(&tmp_path, bytes).await.map_err(WorkerError::Io)?;
    tokio::fs::rename(&tmp_path, output_file).await.map_err(WorkerError::Io)?;
    Ok(())
}

pub struct WorkerLoop {
    job_db: Arc<JobDb>,
    worker: Worker,
    handler: Arc<dyn JobHandler>,
    ctx: HandlerContext,
}

impl WorkerLoop {
    pub fn new(job_db: Arc<JobDb>, worker: Worker, handler: Arc<dyn JobHandler>, ctx: HandlerContext) -> Self {
        Self { job_db, worker, handler, ctx }
    }

    /// Register as `idle`, send an immediate heartbeat, then run the
    /// poll loop until a shutdown signal arrives.
    pub async fn run(mut self) -> Result<(), WorkerError> {
        self.job_db.register_worker(&self.worker).await?;
        self.job_db.heartbeat(&self.worker.id, WorkerStatus::Idle).await?;
        tracing::info!(worker_id = %self.worker.id, job_type = %self.worker.worker_type, "worker registered");

        #[cfg(unix)]
        let mut terminate = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .map_err(WorkerError::Io)?;

        loop {
            #[cfg(unix)]
            {
                tokio::select! {
                    _ = terminate.recv() => {
                        tracing::info!(worker_id = %self.worker.id, "received SIGTERM, shutting down");
                        self.job_db.mark_worker_status(&self.worker.id, WorkerStatus::Dead).await?;
                        return Ok(());
                    }
                    result = self.tick() => {
                        if !result? {
                            tokio::time::sleep(empty_poll_sleep()).await;
                        }
                    }
                }
            }
            #[cfg(not(unix))]
            {
                if !self.tick().await? {
                    tokio::time::sleep(empty_poll_sleep()).await;
                }
            }
        }
    }

    /// One iteration: claim a job if one is pending, run it to
    /// completion, and heartbeat. Returns `true` if a job was claimed
    /// (so the caller skips the empty-poll sleep).
    async fn tick(&mut self) -> Result<bool, WorkerError> {
        let Some(job) = self
            .job_db
            .get_next_job(self.worker.worker_type, &self.worker.id)
            .await?
        else {
            self.job_db.heartbeat(&self.worker.id, WorkerStatus::Idle).await?;
            return Ok(false);
        };

        self.job_db.heartbeat(&self.worker.id, WorkerStatus::Busy).await?;
        self.run_job(job).await?;
        self.job_db.heartbeat(&self.worker.id, WorkerStatus::Idle).await?;
        Ok(true)
    }

    async fn run_job(&mut self, job: Job) -> Result<(), WorkerError> {
        if self.job_db.is_job_cancelled(&job.id).await? {
            tracing::info!(job_id = %job.id, "job cancelled before execution, skipping");
            return Ok(());
        }

        let policy = RetryPolicy::subprocess_transient();
        let mut attempt = 0;
        let outcome = loop {
            match self.handler.handle(&job, &self.ctx).await {
                Ok(output) => break Ok(output),
                Err(e) if e.is_transient() && policy.should_retry(attempt) => {
                    let delay = policy.delay_for(attempt, jitter_sample());
                    tracing::warn!(job_id = %job.id, attempt, error = %e, ?delay, "transient handler failure, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => break Err(e),
            }
        };

        if self.job_db.is_job_cancelled(&job.id).await? {
            tracing::info!(job_id = %job.id, "job cancelled during execution, discarding result");
            return Ok(());
        }

        match outcome {
            Ok(output) if output.bytes.is_empty() => {
                let error = HandlerError::Permanent(format!(
                    "{} produced an empty result for {}",
                    job.job_type, job.output_file
                ));
                self.fail_job(&job, &error).await?;
            }
            Ok(output) => {
                write_output_atomically(Path::new(&job.output_file), &output.bytes).await?;
                self.job_db
                    .update_job_status(
                        &job.id,
                        JobStatus::Completed,
                        None,
                        Some(&JobResult { warnings: output.warnings }),
                    )
                    .await?;
                self.job_db.record_job_outcome(&self.worker.id, false).await?;
                self.job_db
                    .add_to_cache(&job.output_file, &job.content_hash, job.payload.output_metadata().as_str())
                    .await?;
            }
            Err(e) => {
                self.fail_job(&job, &e).await?;
            }
        }
        Ok(())
    }

    async fn fail_job(&mut self, job: &Job, error: &HandlerError) -> Result<(), WorkerError> {
        self.job_db
            .update_job_status(&job.id, JobStatus::Failed, Some(error.message()), None)
            .await?;
        self.job_db.record_job_outcome(&self.worker.id, true).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "loop_tests.rs"]
mod tests;
