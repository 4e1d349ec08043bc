// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The Pool Manager (`spec.md` §4.5): bounded-concurrency worker
//! startup, registration-timeout polling, and the background health
//! monitor. Delegates the actual launch/signal/observe mechanics to a
//! `WorkerExecutor` per execution mode so this module stays agnostic to
//! subprocess vs. container runtimes.

use crate::error::PoolError;
use clxo_core::{ExecutionMode, WorkerConfig, WorkerId, WorkerStatus};
use clxo_executor::{StartWorkerSpec, WorkerExecutor};
use clxo_storage::JobDb;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Env var name matches the original's `CLX_MAX_WORKER_STARTUP_CONCURRENCY`
/// (`spec.md` §4.5), renamed to this orchestrator's `CLXO_` prefix.
const MAX_STARTUP_CONCURRENCY_ENV: &str = "CLXO_MAX_WORKER_STARTUP_CONCURRENCY";
const DEFAULT_MAX_STARTUP_CONCURRENCY: usize = 10;
const DEFAULT_REGISTRATION_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_HEALTH_CHECK_INTERVAL: Duration = Duration::from_secs(10);
/// Hard-coded in the original (`_is_heartbeat_stale(last_heartbeat, 30)`),
/// carried over verbatim rather than made configurable. Also the
/// freshness window the Lifecycle Manager uses for its healthy-worker
/// count (`spec.md` §4.6).
pub(crate) const HEARTBEAT_STALE_MS: u64 = 30_000;

#[derive(Debug, Clone)]
pub struct PoolManagerConfig {
    pub job_db_path: PathBuf,
    pub cache_db_path: Option<PathBuf>,
    pub workspace_root: PathBuf,
    pub source_root: Option<PathBuf>,
    pub log_level: String,
    pub plantuml_jar: Option<PathBuf>,
    pub drawio_executable: Option<PathBuf>,
    pub registration_timeout: Duration,
    pub health_check_interval: Duration,
    pub max_startup_concurrency: usize,
}

impl PoolManagerConfig {
    pub fn new(job_db_path: PathBuf, workspace_root: PathBuf) -> Self {
        let max_startup_concurrency = std::env::var(MAX_STARTUP_CONCURRENCY_ENV)
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_MAX_STARTUP_CONCURRENCY);
        Self {
            job_db_path,
            cache_db_path: None,
            workspace_root,
            source_root: None,
            log_level: "info".to_string(),
            plantuml_jar: None,
            drawio_executable: None,
            registration_timeout: DEFAULT_REGISTRATION_TIMEOUT,
            health_check_interval: DEFAULT_HEALTH_CHECK_INTERVAL,
            max_startup_concurrency,
        }
    }
}

/// Outcome of one worker's startup attempt, for the partial-failure-
/// tolerant startup report.
#[derive(Debug)]
pub enum WorkerStartOutcome {
    Started(WorkerId),
    Failed { job_type: clxo_core::JobType, index: u32, error: String },
}

#[derive(Debug, Default)]
pub struct StartupReport {
    pub started: Vec<WorkerId>,
    pub failed: Vec<(clxo_core::JobType, u32, String)>,
}

impl StartupReport {
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct PoolManager {
    job_db: Arc<JobDb>,
    executors: HashMap<ExecutionMode, Arc<dyn WorkerExecutor>>,
    config: PoolManagerConfig,
    /// Last `(cpu_secs, sampled_at)` observed per worker — `WorkerStats::
    /// cpu_percent` is raw accumulated CPU seconds, so hang detection
    /// needs two samples to rate it into a percentage over elapsed time.
    cpu_samples: tokio::sync::Mutex<HashMap<WorkerId, (f64, tokio::time::Instant)>>,
}

impl PoolManager {
    pub fn new(
        job_db: Arc<JobDb>,
        executors: HashMap<ExecutionMode, Arc<dyn WorkerExecutor>>,
        config: PoolManagerConfig,
    ) -> Self {
        Self { job_db, executors, config, cpu_samples: tokio::sync::Mutex::new(HashMap::new()) }
    }

    pub fn job_db(&self) -> &Arc<JobDb> {
        &self.job_db
    }

    fn executor_for(&self, mode: ExecutionMode) -> Result<&Arc<dyn WorkerExecutor>, PoolError> {
        self.executors
            .get(&mode)
            .ok_or_else(|| PoolError::Executor(clxo_executor::ExecutorError::NotFound(format!("{mode:?}"))))
    }

    /// Clears worker rows left behind by a prior, uncleanly-stopped run
    /// before this run starts any new ones (`spec.md` §4.5's stale-row
    /// cleanup on startup).
    pub async fn clear_stale_rows(&self) -> Result<usize, PoolError> {
        let workers = self.job_db.list_workers(None).await?;
        let mut cleared = 0;
        for worker in workers {
            self.job_db.remove_worker(&worker.id).await?;
            cleared += 1;
        }
        Ok(cleared)
    }

    /// Start every configured worker, bounded to
    /// `max_startup_concurrency` in-flight launches at a time, tolerating
    /// individual failures rather than aborting the whole batch.
    pub async fn start_workers(&self, workers: &[WorkerConfig]) -> StartupReport {
        let semaphore = Arc::new(Semaphore::new(self.config.max_startup_concurrency));
        let mut join_set = tokio::task::JoinSet::new();

        for worker_config in workers {
            for index in 0..worker_config.count {
                let semaphore = semaphore.clone();
                let worker_config = worker_config.clone();
                let outcome = self.start_one(worker_config.clone(), index);
                join_set.spawn(async move {
                    let _permit = semaphore.acquire_owned().await;
                    outcome.await
                });
            }
        }

        let mut report = StartupReport::default();
        while let Some(result) = join_set.join_next().await {
            match result {
                Ok(WorkerStartOutcome::Started(id)) => report.started.push(id),
                Ok(WorkerStartOutcome::Failed { job_type, index, error }) => {
                    report.failed.push((job_type, index, error));
                }
                Err(e) => {
                    tracing::error!(error = %e, "worker startup task panicked");
                }
            }
        }
        report
    }

    async fn start_one(&self, worker_config: WorkerConfig, index: u32) -> WorkerStartOutcome {
        let worker_id = WorkerId::new();
        match self.start_and_wait(&worker_config, index, worker_id.clone()).await {
            Ok(()) => WorkerStartOutcome::Started(worker_id),
            Err(e) => WorkerStartOutcome::Failed {
                job_type: worker_config.job_type,
                index,
                error: e.to_string(),
            },
        }
    }

    async fn start_and_wait(
        &self,
        worker_config: &WorkerConfig,
        index: u32,
        worker_id: WorkerId,
    ) -> Result<(), PoolError> {
        let executor = self.executor_for(worker_config.execution_mode)?;

        let mut extra_env = HashMap::new();
        if let Some(jar) = &self.config.plantuml_jar {
            extra_env.insert("CLXO_PLANTUML_JAR".to_string(), jar.to_string_lossy().into_owned());
        }
        if let Some(exe) = &self.config.drawio_executable {
            extra_env.insert("CLXO_DRAWIO_EXECUTABLE".to_string(), exe.to_string_lossy().into_owned());
        }

        let spec = StartWorkerSpec {
            worker_id: worker_id.clone(),
            job_type: worker_config.job_type,
            index,
            job_db_path: self.config.job_db_path.clone(),
            cache_db_path: self.config.cache_db_path.clone(),
            workspace_root: self.config.workspace_root.clone(),
            source_root: self.config.source_root.clone(),
            log_level: self.config.log_level.clone(),
            extra_env,
            image: worker_config.image.clone(),
            memory_limit_mb: worker_config.memory_limit_mb,
        };

        executor.start_worker(&spec).await?;
        self.wait_for_registration(&worker_id).await
    }

    async fn wait_for_registration(&self, worker_id: &WorkerId) -> Result<(), PoolError> {
        let deadline = tokio::time::Instant::now() + self.config.registration_timeout;
        loop {
            if let Some(worker) = self.job_db.get_worker(worker_id).await? {
                if worker.status.is_healthy() || worker.status == WorkerStatus::Created {
                    return Ok(());
                }
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(PoolError::RegistrationTimeout(worker_id.clone()));
            }
            tokio::time::sleep(Duration::from_millis(200)).await;
        }
    }

    /// Stop a set of workers, looking up each one's executor/execution
    /// mode from its registered row.
    pub async fn stop_workers(&self, worker_ids: &[WorkerId], force: bool) -> Result<(), PoolError> {
        for id in worker_ids {
            let Some(worker) = self.job_db.get_worker(id).await? else {
                continue;
            };
            let executor = self.executor_for(worker.execution_mode)?;
            executor.stop_worker(&worker.executor_id, force).await?;
            executor.cleanup(&worker.executor_id).await?;
            self.job_db.remove_worker(id).await?;
        }
        Ok(())
    }

    /// One health-monitor pass: find heartbeat-stale workers, confirm
    /// with the executor whether the runtime is actually gone or merely
    /// making no progress, and reassign any jobs a dead worker was
    /// holding.
    pub async fn check_health(&self) -> Result<(), PoolError> {
        let stale = self.job_db.stale_workers(HEARTBEAT_STALE_MS).await?;
        let mut dead = Vec::new();

        for worker in &stale {
            let Ok(executor) = self.executor_for(worker.execution_mode) else {
                continue;
            };
            let alive = executor.is_worker_running(&worker.executor_id).await.unwrap_or(false);
            if !alive {
                tracing::warn!(worker_id = %worker.id, "worker runtime is gone, marking dead");
                self.job_db.mark_worker_status(&worker.id, WorkerStatus::Dead).await?;
                dead.push(worker.id.clone());
                self.cpu_samples.lock().await.remove(&worker.id);
                continue;
            }

            if worker.status == WorkerStatus::Busy {
                if let Ok(stats) = executor.get_worker_stats(&worker.executor_id).await {
                    let now = tokio::time::Instant::now();
                    let prev = self.cpu_samples.lock().await.insert(worker.id.clone(), (stats.cpu_percent, now));
                    if let Some((prev_cpu_secs, prev_sampled_at)) = prev {
                        let elapsed = now.duration_since(prev_sampled_at).as_secs_f64();
                        if elapsed > 0.0 {
                            let cpu_rate_percent = ((stats.cpu_percent - prev_cpu_secs).max(0.0) / elapsed) * 100.0;
                            if cpu_rate_percent < 1.0 {
                                tracing::warn!(worker_id = %worker.id, cpu_rate_percent, "worker busy but idle CPU, marking hung");
                                self.job_db.mark_worker_status(&worker.id, WorkerStatus::Hung).await?;
                            }
                        }
                    }
                }
            } else {
                self.cpu_samples.lock().await.remove(&worker.id);
            }
        }

        if !dead.is_empty() {
            let reset = self.job_db.reset_hung_jobs(&dead).await?;
            tracing::info!(count = reset, "reassigned jobs held by dead workers");
        }
        Ok(())
    }

    /// Run the health monitor forever on `health_check_interval`, until
    /// `shutdown` resolves.
    pub async fn run_health_monitor(self: Arc<Self>, mut shutdown: tokio::sync::watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.config.health_check_interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.check_health().await {
                        tracing::error!(error = %e, "health check pass failed");
                    }
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        return;
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
