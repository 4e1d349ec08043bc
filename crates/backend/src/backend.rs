// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Backend (`spec.md` §4.7): the pipeline driver's view of "execute
//! an operation" — result-cache probe, job-cache probe, worker-
//! availability gate, submission, and the completion-polling loop that
//! drains submitted jobs into the Cache DB.

use crate::categorize::categorize;
use crate::config::BackendConfig;
use crate::error::BackendError;
use crate::operation::Operation;
use crate::reporter::Reporter;
use clxo_core::{CachedResult, CorrelationId, JobId, JobStatus, JobType, NewJob, OutputMetadata, StoredResult, WorkerStatus};
use clxo_pool::LifecycleManager;
use clxo_storage::{CacheDb, GetResultKey, JobDb};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// What the completion loop needs to finish processing a job once it
/// reaches a terminal state — everything `execute_operation`'s caller
/// supplied that isn't already on the `jobs` row.
#[derive(Debug, Clone)]
struct ActiveJob {
    job_type: JobType,
    input_file: String,
    output_file: String,
    content_hash: String,
    output_metadata: OutputMetadata,
    correlation_id: CorrelationId,
}

pub struct Backend {
    job_db: Arc<JobDb>,
    cache_db: Arc<CacheDb>,
    lifecycle: Arc<LifecycleManager>,
    reporter: Arc<dyn Reporter>,
    config: BackendConfig,
    active_jobs: Mutex<HashMap<JobId, ActiveJob>>,
    /// Set when `execute_operation` short-circuits on a cached user
    /// error — there is no job to poll for these, so `wait_for_completion`
    /// folds this into its failure verdict instead (`spec.md` §8 scenario
    /// 3: a cached error re-surfaces without invoking a worker).
    cached_failures: std::sync::atomic::AtomicBool,
}

impl Backend {
    pub fn new(
        job_db: Arc<JobDb>,
        cache_db: Arc<CacheDb>,
        lifecycle: Arc<LifecycleManager>,
        reporter: Arc<dyn Reporter>,
        config: BackendConfig,
    ) -> Self {
        Self {
            job_db,
            cache_db,
            lifecycle,
            reporter,
            config,
            active_jobs: Mutex::new(HashMap::new()),
            cached_failures: std::sync::atomic::AtomicBool::new(false),
        }
    }

    /// Non-blocking: resolves from cache if possible, otherwise submits
    /// a job and tracks it for `wait_for_completion`.
    pub async fn execute_operation(&self, op: Operation) -> Result<(), BackendError> {
        let job_type = op.job_type()?;
        let output_metadata = op.output_metadata();

        let key = GetResultKey {
            input_file: &op.input_file,
            content_hash: &op.content_hash,
            output_metadata: &output_metadata,
        };

        if let Some(cached) = self.cache_db.get_result(key.clone()).await? {
            if !self.config.incremental {
                tokio::fs::write(&op.output_file, cached.result.result_bytes()).await?;
            }
            for issue in self.cache_db.get_issues(key.clone()).await? {
                if let clxo_storage::CachedIssue::Warning(w) = issue {
                    self.reporter.warning(&op.input_file, &w);
                }
            }
            self.reporter.cache_hit(&op.input_file, &op.output_file);
            return Ok(());
        }

        let issues = self.cache_db.get_issues(key.clone()).await?;
        if let Some(error) = issues.iter().find_map(|issue| match issue {
            clxo_storage::CachedIssue::Error(e) => Some(e),
            clxo_storage::CachedIssue::Warning(_) => None,
        }) {
            for issue in &issues {
                if let clxo_storage::CachedIssue::Warning(w) = issue {
                    self.reporter.warning(&op.input_file, w);
                }
            }
            self.reporter.error(error);
            self.cached_failures.store(true, std::sync::atomic::Ordering::Relaxed);
            return Ok(());
        }

        if self.job_db.check_cache(&op.output_file, &op.content_hash).await?
            && tokio::fs::metadata(&op.output_file).await.is_ok()
        {
            self.reporter.cache_hit(&op.input_file, &op.output_file);
            return Ok(());
        }

        self.await_worker_availability(job_type).await?;

        let job_id = self
            .job_db
            .add_job(NewJob {
                job_type,
                input_file: op.input_file.clone(),
                output_file: op.output_file.clone(),
                content_hash: op.content_hash.clone(),
                payload: op.payload,
                correlation_id: op.correlation_id.clone(),
            })
            .await?;

        self.reporter.job_submitted(&op.input_file, &op.output_file);
        self.active_jobs.lock().await.insert(
            job_id,
            ActiveJob {
                job_type,
                input_file: op.input_file,
                output_file: op.output_file,
                content_hash: op.content_hash,
                output_metadata,
                correlation_id: op.correlation_id,
            },
        );
        Ok(())
    }

    /// Zero available workers waits a bounded time for any `created`
    /// worker to activate before raising the fatal "no workers" error
    /// (`spec.md` §4.7, point 4).
    async fn await_worker_availability(&self, job_type: JobType) -> Result<(), BackendError> {
        if self.lifecycle.healthy_worker_count(job_type).await? > 0 {
            return Ok(());
        }
        let deadline = Instant::now() + self.config.worker_activation_wait;
        loop {
            tokio::time::sleep(Duration::from_millis(200)).await;
            if self.lifecycle.healthy_worker_count(job_type).await? > 0 {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(BackendError::NoWorkers(job_type));
            }
        }
    }

    /// Drain every submitted job to a terminal state, writing results
    /// and categorized errors into the Cache DB as they land. Returns
    /// `true` iff nothing failed.
    pub async fn wait_for_completion(&self) -> Result<bool, BackendError> {
        let deadline = Instant::now() + self.config.completion_deadline;
        let mut any_failed = self.cached_failures.swap(false, std::sync::atomic::Ordering::Relaxed);
        let mut ticks_since_sweep = 0u32;
        const SWEEP_EVERY_N_TICKS: u32 = 10;

        loop {
            if self.active_jobs.lock().await.is_empty() {
                return Ok(!any_failed);
            }
            if Instant::now() >= deadline {
                return Err(BackendError::CompletionDeadline(self.config.completion_deadline));
            }

            tokio::time::sleep(self.config.poll_interval).await;

            ticks_since_sweep += 1;
            if ticks_since_sweep >= SWEEP_EVERY_N_TICKS {
                ticks_since_sweep = 0;
                self.sweep_hung_jobs().await?;
            }

            let ids: Vec<JobId> = self.active_jobs.lock().await.keys().copied().collect();
            let statuses = self.job_db.get_job_statuses_batch(&ids).await?;

            for id in ids {
                let Some(snapshot) = statuses.get(&id) else { continue };
                if !snapshot.status.is_terminal() {
                    continue;
                }
                let active = self.active_jobs.lock().await.remove(&id);
                let Some(active) = active else { continue };

                match snapshot.status {
                    JobStatus::Completed => {
                        if let Some(result) = &snapshot.result {
                            for warning in &result.warnings {
                                self.reporter.warning(&active.input_file, warning);
                                let key = GetResultKey {
                                    input_file: &active.input_file,
                                    content_hash: &active.content_hash,
                                    output_metadata: &active.output_metadata,
                                };
                                self.cache_db.store_warning(key, warning).await?;
                            }
                        }
                        self.store_completed_result(&active).await?;
                        self.reporter.job_completed(&active.input_file, &active.output_file);
                    }
                    JobStatus::Failed => {
                        any_failed = true;
                        let raw = snapshot.error.clone().unwrap_or_default();
                        let issue = categorize(
                            active.job_type,
                            &active.input_file,
                            &active.content_hash,
                            &active.output_metadata,
                            &raw,
                        );
                        if issue.error_type.is_cacheable() {
                            self.cache_db.store_error(&issue).await?;
                        }
                        self.reporter.error(&issue);
                    }
                    JobStatus::Cancelled => {}
                    JobStatus::Pending | JobStatus::Processing => unreachable!("filtered by is_terminal"),
                }
            }
        }
    }

    async fn store_completed_result(&self, active: &ActiveJob) -> Result<(), BackendError> {
        let bytes = tokio::fs::read(&active.output_file).await?;
        let result = match active.job_type {
            JobType::Notebook => CachedResult::Notebook(String::from_utf8_lossy(&bytes).into_owned()),
            JobType::PlantUml | JobType::Drawio => CachedResult::Image(bytes),
        };
        let stored = StoredResult {
            input_file: active.input_file.clone(),
            content_hash: active.content_hash.clone(),
            output_metadata: active.output_metadata.clone(),
            correlation_id: active.correlation_id,
            source_file: active.input_file.clone(),
            result,
            stored_at_ms: clxo_storage::now_ms(),
        };
        self.cache_db.store_latest_result(&stored, self.config.retention.result_versions).await?;
        Ok(())
    }

    async fn sweep_hung_jobs(&self) -> Result<(), BackendError> {
        let workers = self.job_db.list_workers(None).await?;
        let dead: Vec<_> = workers.iter().filter(|w| w.status == WorkerStatus::Dead).map(|w| w.id.clone()).collect();
        if !dead.is_empty() {
            let reset = self.job_db.reset_hung_jobs(&dead).await?;
            if reset > 0 {
                tracing::info!(count = reset, "completion loop reset jobs held by dead workers");
            }
        }
        Ok(())
    }

    /// Copy with incremental-mode semantics: skip if the destination
    /// already exists and `incremental` is set.
    pub async fn copy_file_to_output(&self, src: &Path, dest: &Path) -> Result<(), BackendError> {
        if self.config.incremental && tokio::fs::metadata(dest).await.is_ok() {
            return Ok(());
        }
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::copy(src, dest).await?;
        Ok(())
    }

    /// Copy every file directly under `src_dir` into `dest_dir`, each
    /// respecting the same incremental-mode skip rule.
    pub async fn copy_dir_group_to_output(&self, src_dir: &Path, dest_dir: &Path) -> Result<(), BackendError> {
        tokio::fs::create_dir_all(dest_dir).await?;
        let mut entries = tokio::fs::read_dir(src_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let dest = dest_dir.join(entry.file_name());
            self.copy_file_to_output(&entry.path(), &dest).await?;
        }
        Ok(())
    }

    /// Short final drain, then retention cleanup on both stores
    /// (`spec.md` §4.7's shutdown sequence).
    pub async fn shutdown(&self) -> Result<(), BackendError> {
        let _ = tokio::time::timeout(Duration::from_secs(5), self.wait_for_completion()).await;
        let job_report = self.job_db.cleanup_all(self.config.retention).await?;
        let cache_report = self.cache_db.cleanup_all(self.config.retention).await?;
        tracing::info!(
            jobs_deleted = job_report.jobs_deleted,
            events_deleted = job_report.events_deleted,
            issues_deleted = cache_report.issues_deleted,
            results_deleted = cache_report.results_deleted,
            "retention cleanup complete"
        );
        Ok(())
    }
}

#[cfg(test)]
#[path = "backend_tests.rs"]
mod tests;
