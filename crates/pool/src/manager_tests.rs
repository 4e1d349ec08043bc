// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use async_trait::async_trait;
use clxo_core::{WorkerBuilder, WorkerStatus};
use clxo_executor::ExecutorError;
use std::collections::HashMap as StdHashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex as AsyncMutex;

/// Unlike `clxo_executor::fake::FakeExecutor`, this fixture also
/// registers a worker row on `start_worker`, simulating the worker
/// binary's own near-instant self-registration so
/// `wait_for_registration` doesn't have to wait out the real timeout.
struct AutoRegisterExecutor {
    job_db: Arc<JobDb>,
    mode: ExecutionMode,
    fail_next: AtomicBool,
    stopped: AsyncMutex<Vec<String>>,
}

impl AutoRegisterExecutor {
    fn new(job_db: Arc<JobDb>, mode: ExecutionMode) -> Self {
        Self { job_db, mode, fail_next: AtomicBool::new(false), stopped: AsyncMutex::new(Vec::new()) }
    }
}

#[async_trait]
impl WorkerExecutor for AutoRegisterExecutor {
    fn execution_mode(&self) -> ExecutionMode {
        self.mode
    }

    async fn start_worker(&self, spec: &StartWorkerSpec) -> Result<String, ExecutorError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(ExecutorError::SpawnFailed("forced test failure".to_string()));
        }
        let executor_id = format!("auto:{}", spec.worker_id);
        let worker = WorkerBuilder::default()
            .id(spec.worker_id.clone())
            .worker_type(spec.job_type)
            .executor_id(executor_id.clone())
            .status(WorkerStatus::Idle)
            .execution_mode(self.mode)
            .build();
        self.job_db.register_worker(&worker).await.expect("register_worker");
        Ok(executor_id)
    }

    async fn stop_worker(&self, executor_id: &str, _force: bool) -> Result<(), ExecutorError> {
        self.stopped.lock().await.push(executor_id.to_string());
        Ok(())
    }

    async fn is_worker_running(&self, _executor_id: &str) -> Result<bool, ExecutorError> {
        Ok(true)
    }

    async fn get_worker_stats(&self, _executor_id: &str) -> Result<clxo_executor::WorkerStats, ExecutorError> {
        Ok(clxo_executor::WorkerStats { cpu_percent: 0.0, memory_bytes: 0, uptime_secs: Some(1) })
    }

    async fn cleanup(&self, _executor_id: &str) -> Result<(), ExecutorError> {
        Ok(())
    }

    async fn get_container_logs(&self, _executor_id: &str, _tail_lines: usize) -> Result<String, ExecutorError> {
        Ok(String::new())
    }
}

async fn open_job_db() -> (Arc<JobDb>, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("tempdir");
    let db = JobDb::open(&dir.path().join("jobs.sqlite3")).await.expect("open job db");
    (Arc::new(db), dir)
}

fn test_config(job_db_path: std::path::PathBuf) -> PoolManagerConfig {
    let mut config = PoolManagerConfig::new(job_db_path, std::env::temp_dir());
    config.registration_timeout = Duration::from_secs(2);
    config.health_check_interval = Duration::from_millis(50);
    config
}

#[tokio::test]
async fn start_workers_registers_configured_count() {
    let (job_db, dir) = open_job_db().await;
    let executor: Arc<dyn WorkerExecutor> = Arc::new(AutoRegisterExecutor::new(job_db.clone(), ExecutionMode::ManagedSubprocess));
    let mut executors: StdHashMap<ExecutionMode, Arc<dyn WorkerExecutor>> = StdHashMap::new();
    executors.insert(ExecutionMode::ManagedSubprocess, executor);

    let manager = PoolManager::new(job_db.clone(), executors, test_config(dir.path().join("jobs.sqlite3")));
    let report = manager
        .start_workers(&[clxo_core::WorkerConfig {
            job_type: clxo_core::JobType::Notebook,
            count: 3,
            execution_mode: ExecutionMode::ManagedSubprocess,
            image: None,
            memory_limit_mb: None,
        }])
        .await;

    assert!(report.all_succeeded());
    assert_eq!(report.started.len(), 3);
    assert_eq!(job_db.list_workers(None).await.expect("list").len(), 3);
}

#[tokio::test]
async fn start_workers_tolerates_partial_failure() {
    let (job_db, dir) = open_job_db().await;
    let fake = Arc::new(AutoRegisterExecutor::new(job_db.clone(), ExecutionMode::ManagedSubprocess));
    fake.fail_next.store(true, Ordering::SeqCst);
    let executor: Arc<dyn WorkerExecutor> = fake;
    let mut executors: StdHashMap<ExecutionMode, Arc<dyn WorkerExecutor>> = StdHashMap::new();
    executors.insert(ExecutionMode::ManagedSubprocess, executor);

    let manager = PoolManager::new(job_db.clone(), executors, test_config(dir.path().join("jobs.sqlite3")));
    let report = manager
        .start_workers(&[clxo_core::WorkerConfig {
            job_type: clxo_core::JobType::Notebook,
            count: 1,
            execution_mode: ExecutionMode::ManagedSubprocess,
            image: None,
            memory_limit_mb: None,
        }])
        .await;

    assert!(!report.all_succeeded());
    assert_eq!(report.started.len(), 0);
    assert_eq!(report.failed.len(), 1);
}

#[tokio::test]
async fn stop_workers_removes_rows_and_calls_executor() {
    let (job_db, dir) = open_job_db().await;
    let executor: Arc<dyn WorkerExecutor> = Arc::new(AutoRegisterExecutor::new(job_db.clone(), ExecutionMode::ManagedSubprocess));
    let mut executors: StdHashMap<ExecutionMode, Arc<dyn WorkerExecutor>> = StdHashMap::new();
    executors.insert(ExecutionMode::ManagedSubprocess, executor);

    let manager = PoolManager::new(job_db.clone(), executors, test_config(dir.path().join("jobs.sqlite3")));
    let report = manager
        .start_workers(&[clxo_core::WorkerConfig {
            job_type: clxo_core::JobType::Notebook,
            count: 1,
            execution_mode: ExecutionMode::ManagedSubprocess,
            image: None,
            memory_limit_mb: None,
        }])
        .await;

    manager.stop_workers(&report.started, false).await.expect("stop_workers");
    assert!(job_db.list_workers(None).await.expect("list").is_empty());
}

#[tokio::test]
async fn check_health_marks_dead_and_resets_hung_jobs() {
    let (job_db, dir) = open_job_db().await;
    let worker = WorkerBuilder::default()
        .worker_type(clxo_core::JobType::Notebook)
        .status(WorkerStatus::Busy)
        .execution_mode(ExecutionMode::ManagedSubprocess)
        .last_heartbeat_ms(0)
        .build();
    job_db.register_worker(&worker).await.expect("register");

    struct DeadExecutor;
    #[async_trait]
    impl WorkerExecutor for DeadExecutor {
        fn execution_mode(&self) -> ExecutionMode {
            ExecutionMode::ManagedSubprocess
        }
        async fn start_worker(&self, _spec: &StartWorkerSpec) -> Result<String, ExecutorError> {
            unreachable!("not exercised in this test")
        }
        async fn stop_worker(&self, _executor_id: &str, _force: bool) -> Result<(), ExecutorError> {
            Ok(())
        }
        async fn is_worker_running(&self, _executor_id: &str) -> Result<bool, ExecutorError> {
            Ok(false)
        }
        async fn get_worker_stats(&self, _executor_id: &str) -> Result<clxo_executor::WorkerStats, ExecutorError> {
            Ok(clxo_executor::WorkerStats { cpu_percent: 0.0, memory_bytes: 0, uptime_secs: None })
        }
        async fn cleanup(&self, _executor_id: &str) -> Result<(), ExecutorError> {
            Ok(())
        }
        async fn get_container_logs(&self, _executor_id: &str, _tail_lines: usize) -> Result<String, ExecutorError> {
            Ok(String::new())
        }
    }

    let executor: Arc<dyn WorkerExecutor> = Arc::new(DeadExecutor);
    let mut executors: StdHashMap<ExecutionMode, Arc<dyn WorkerExecutor>> = StdHashMap::new();
    executors.insert(ExecutionMode::ManagedSubprocess, executor);

    let manager = PoolManager::new(job_db.clone(), executors, test_config(dir.path().join("jobs.sqlite3")));
    manager.check_health().await.expect("check_health");

    let refreshed = job_db.get_worker(&worker.id).await.expect("get").expect("present");
    assert_eq!(refreshed.status, WorkerStatus::Dead);
}
